//! Rule-based recommendations for the home brand.
//!
//! Each rule looks at the ranked metrics, hashtag trends and cultural
//! moments independently and emits at most one [`Recommendation`]. Rules
//! are not mutually exclusive.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::attribute::UNKNOWN_BRAND;
use crate::config::AnalysisConfig;
use crate::trends::{TrendWindow, WindowSlot};
use crate::types::{
    BrandMetrics, CulturalMoment, HashtagMetrics, Post, Priority, Recommendation,
};

/// Competitor names quoted in the viral-moment recommendation.
const MAX_NAMED_COMPETITORS: usize = 3;

/// Inputs shared by every rule.
#[derive(Debug, Clone, Copy)]
pub struct InsightContext<'a> {
    /// Brand metrics in rank order.
    pub ranked: &'a [BrandMetrics],
    /// Hashtag trends in trend order.
    pub trends: &'a [HashtagMetrics],
    /// All detected moments, before any truncation.
    pub moments: &'a [CulturalMoment],
    /// Every attributed post of the run.
    pub posts: &'a [Post],
    /// The run's trend window; `None` when no post carried a timestamp.
    pub window: Option<&'a TrendWindow>,
    pub config: &'a AnalysisConfig,
}

impl InsightContext<'_> {
    fn is_home(&self, brand: &str) -> bool {
        brand.trim().to_lowercase() == self.config.home_brand.trim().to_lowercase()
    }

    fn home(&self) -> Option<&BrandMetrics> {
        self.ranked.iter().find(|m| self.is_home(&m.brand))
    }

    /// Without a window the whole run counts as the current window;
    /// with one, undated items fall outside it.
    fn in_current_window(&self, timestamp: Option<DateTime<Utc>>) -> bool {
        match self.window {
            None => true,
            Some(window) => {
                timestamp.and_then(|ts| window.classify(ts)) == Some(WindowSlot::Current)
            }
        }
    }

    /// Home-brand posts inside the current window.
    fn home_posts_in_window(&self) -> u64 {
        if self.window.is_none() {
            return self.home().map_or(0, |m| m.posts);
        }
        let count = self
            .posts
            .iter()
            .filter(|p| self.is_home(&p.brand) && self.in_current_window(p.timestamp))
            .count();
        u64::try_from(count).unwrap_or(u64::MAX)
    }
}

type Rule = fn(&InsightContext<'_>) -> Option<Recommendation>;

const RULES: &[Rule] = &[
    engagement_gap_rule,
    low_frequency_rule,
    trend_opportunity_rule,
    viral_moment_rule,
];

/// Evaluate every rule and order the results by priority, then by the
/// strength of the signal behind them.
#[must_use]
pub fn generate_recommendations(ctx: &InsightContext<'_>) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> =
        RULES.iter().filter_map(|rule| rule(ctx)).collect();

    recommendations.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.signal.total_cmp(&a.signal))
            .then_with(|| a.title.cmp(&b.title))
    });
    recommendations
}

/// Home brand ranked outside the top `ceil(N * fraction)` brands.
///
/// The leader quoted is the best-ranked real competitor; the `"Unknown"`
/// bucket is never held up as a brand to learn from.
fn engagement_gap_rule(ctx: &InsightContext<'_>) -> Option<Recommendation> {
    let home = ctx.home()?;
    let leader = ctx
        .ranked
        .iter()
        .find(|m| m.brand != UNKNOWN_BRAND && !ctx.is_home(&m.brand))?;

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let cutoff = (ctx.ranked.len() as f64 * ctx.config.engagement_gap_fraction).ceil() as u64;
    if home.rank <= cutoff || leader.rank > home.rank {
        return None;
    }

    let multiple = (home.avg_engagement > 0.0).then(|| leader.avg_engagement / home.avg_engagement);
    let priority = match multiple {
        Some(m) if m < ctx.config.critical_gap_multiple => Priority::High,
        _ => Priority::Critical,
    };

    let comparison = match multiple {
        Some(m) => format!(
            "{} averages {m:.1}x the engagement per post of {} ({} vs {})",
            leader.brand,
            home.brand,
            leader.avg_engagement_display(),
            home.avg_engagement_display(),
        ),
        None => format!(
            "{} averages {} engagements per post while {} has recorded none",
            leader.brand,
            leader.avg_engagement_display(),
            home.brand,
        ),
    };

    Some(Recommendation {
        title: "Close the engagement gap".to_string(),
        description: format!(
            "{comparison}; {} ranks {} of {}.",
            home.brand,
            home.rank,
            ctx.ranked.len()
        ),
        priority,
        action: format!(
            "Audit {}'s top-performing formats and hooks and adapt them for the next content cycle.",
            leader.brand
        ),
        signal: multiple.unwrap_or(leader.avg_engagement),
    })
}

/// Home brand posting less than the configured minimum in the current window.
fn low_frequency_rule(ctx: &InsightContext<'_>) -> Option<Recommendation> {
    let posts = ctx.home_posts_in_window();
    let minimum = ctx.config.min_posts_per_window;
    if posts >= minimum {
        return None;
    }

    let shortfall = minimum - posts;
    #[allow(clippy::cast_precision_loss)]
    let signal = shortfall as f64;

    Some(Recommendation {
        title: "Increase posting cadence".to_string(),
        description: format!(
            "{} published {posts} post(s) in this window, {shortfall} short of the {minimum} needed to stay visible.",
            ctx.config.home_brand.trim()
        ),
        priority: Priority::Medium,
        action: format!(
            "Schedule at least {minimum} posts per {}-day window.",
            ctx.config.trend_window_days
        ),
        signal,
    })
}

/// Fastest-growing hashtag above the velocity threshold.
fn trend_opportunity_rule(ctx: &InsightContext<'_>) -> Option<Recommendation> {
    let top = ctx.trends.first()?;
    if top.velocity <= ctx.config.trend_velocity_threshold {
        return None;
    }

    Some(Recommendation {
        title: format!("Create content around #{}", top.tag),
        description: format!(
            "#{} grew {:.0}% window over window ({} -> {} posts).",
            top.tag, top.velocity, top.prior_window_posts, top.current_window_posts
        ),
        priority: Priority::High,
        action: format!(
            "Brief a post or short video that joins the #{} conversation while it is still rising.",
            top.tag
        ),
        signal: top.velocity,
    })
}

/// Competitors went viral in the current window, the home brand did not.
fn viral_moment_rule(ctx: &InsightContext<'_>) -> Option<Recommendation> {
    let recent: Vec<&CulturalMoment> = ctx
        .moments
        .iter()
        .filter(|m| ctx.in_current_window(m.timestamp))
        .collect();
    if recent.iter().any(|m| ctx.is_home(&m.brand_or_author)) {
        return None;
    }

    let competitor_moments: Vec<&CulturalMoment> = recent
        .into_iter()
        .filter(|m| m.brand_or_author != UNKNOWN_BRAND)
        .collect();
    if competitor_moments.is_empty() {
        return None;
    }

    // Moments arrive highest-engagement first; keep that order for naming.
    let mut seen = BTreeSet::new();
    let named: Vec<&str> = competitor_moments
        .iter()
        .map(|m| m.brand_or_author.as_str())
        .filter(|brand| seen.insert(*brand))
        .take(MAX_NAMED_COMPETITORS)
        .collect();

    let count = competitor_moments.len();
    #[allow(clippy::cast_precision_loss)]
    let signal = count as f64;

    Some(Recommendation {
        title: "Competitors are owning viral moments".to_string(),
        description: format!(
            "{count} competitor post(s) crossed the viral threshold ({}), none from {}.",
            named.join(", "),
            ctx.config.home_brand.trim()
        ),
        priority: Priority::Medium,
        action: "Review what made these posts break out and look for a timely angle to respond."
            .to_string(),
        signal,
    })
}

#[cfg(test)]
#[path = "insights_test.rs"]
mod tests;
