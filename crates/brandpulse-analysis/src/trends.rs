//! Hashtag velocity and cultural-moment detection.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};

use crate::config::AnalysisConfig;
use crate::types::{CulturalMoment, HashtagMetrics, Post};

/// Moments this many times over the threshold get an extra label.
const MEGA_VIRAL_MULTIPLE: u64 = 10;
const SUMMARY_MAX_CHARS: usize = 140;

/// Two adjacent, equally long windows ending at `anchor`.
///
/// Current is `(anchor - d, anchor]`, prior is `(anchor - 2d, anchor - d]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendWindow {
    pub anchor: DateTime<Utc>,
    pub length: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSlot {
    Current,
    Prior,
}

impl TrendWindow {
    #[must_use]
    pub fn new(anchor: DateTime<Utc>, days: i64) -> Self {
        Self {
            anchor,
            length: Duration::try_days(days).unwrap_or(Duration::MAX),
        }
    }

    /// Anchor at `as_of` when given, else at the newest post timestamp.
    /// `None` when neither exists; no wall clock is consulted.
    #[must_use]
    pub fn resolve(posts: &[Post], as_of: Option<DateTime<Utc>>, days: i64) -> Option<Self> {
        as_of
            .or_else(|| posts.iter().filter_map(|p| p.timestamp).max())
            .map(|anchor| Self::new(anchor, days))
    }

    #[must_use]
    pub fn classify(&self, timestamp: DateTime<Utc>) -> Option<WindowSlot> {
        if timestamp > self.anchor {
            return None;
        }
        // A window reaching past the representable range is unbounded below.
        let Some(current_start) = self.anchor.checked_sub_signed(self.length) else {
            return Some(WindowSlot::Current);
        };
        if timestamp > current_start {
            return Some(WindowSlot::Current);
        }
        match current_start.checked_sub_signed(self.length) {
            Some(prior_start) if timestamp <= prior_start => None,
            _ => Some(WindowSlot::Prior),
        }
    }
}

/// Percentage change in post count from the prior to the current window.
///
/// An empty prior window is treated as one post so new tags get a finite,
/// large velocity instead of dividing by zero.
#[must_use]
pub fn velocity(current: u64, prior: u64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let (current, prior) = (current as f64, prior as f64);
    (current - prior) / prior.max(1.0) * 100.0
}

#[derive(Debug, Default)]
struct TagAccumulator {
    posts: u64,
    engagement: u64,
    current: u64,
    prior: u64,
}

/// Per-hashtag frequency, average engagement and velocity, trending first.
///
/// Ordered by velocity descending, then total posts descending, then tag.
#[must_use]
pub fn hashtag_trends(posts: &[Post], window: Option<&TrendWindow>) -> Vec<HashtagMetrics> {
    let mut tags: BTreeMap<&str, TagAccumulator> = BTreeMap::new();

    for post in posts {
        let slot = window.zip(post.timestamp).and_then(|(w, ts)| w.classify(ts));
        for tag in &post.hashtags {
            let acc = tags.entry(tag.as_str()).or_default();
            acc.posts += 1;
            acc.engagement = acc.engagement.saturating_add(post.engagement());
            match slot {
                Some(WindowSlot::Current) => acc.current += 1,
                Some(WindowSlot::Prior) => acc.prior += 1,
                None => {}
            }
        }
    }

    let mut trends: Vec<HashtagMetrics> = tags
        .into_iter()
        .map(|(tag, acc)| {
            #[allow(clippy::cast_precision_loss)]
            let avg_engagement = acc.engagement as f64 / acc.posts as f64;
            HashtagMetrics {
                tag: tag.to_string(),
                posts: acc.posts,
                avg_engagement,
                current_window_posts: acc.current,
                prior_window_posts: acc.prior,
                velocity: velocity(acc.current, acc.prior),
            }
        })
        .collect();

    trends.sort_by(compare_trends);
    trends
}

fn compare_trends(a: &HashtagMetrics, b: &HashtagMetrics) -> Ordering {
    b.velocity
        .total_cmp(&a.velocity)
        .then_with(|| b.posts.cmp(&a.posts))
        .then_with(|| a.tag.cmp(&b.tag))
}

/// Every post whose engagement strictly exceeds its platform's viral
/// threshold, highest engagement first. Not truncated.
#[must_use]
pub fn detect_cultural_moments(posts: &[Post], config: &AnalysisConfig) -> Vec<CulturalMoment> {
    let mut moments: Vec<CulturalMoment> = posts
        .iter()
        .filter_map(|post| {
            let threshold = config.viral_threshold(post.platform);
            let engagement = post.engagement();
            (engagement > threshold).then(|| moment_from(post, engagement, threshold))
        })
        .collect();

    moments.sort_by(|a, b| {
        b.engagement
            .cmp(&a.engagement)
            .then_with(|| a.brand_or_author.cmp(&b.brand_or_author))
            .then_with(|| a.url.cmp(&b.url))
    });
    moments
}

fn moment_from(post: &Post, engagement: u64, threshold: u64) -> CulturalMoment {
    let mut labels = BTreeSet::new();
    labels.insert(post.platform.to_string());
    labels.insert("viral".to_string());
    if engagement > threshold.saturating_mul(MEGA_VIRAL_MULTIPLE) {
        labels.insert("mega-viral".to_string());
    }
    labels.extend(post.hashtags.iter().map(|tag| format!("#{tag}")));

    CulturalMoment {
        brand_or_author: post.brand.clone(),
        summary: summarize(post),
        engagement,
        timestamp: post.timestamp,
        labels,
        platform: post.platform,
        url: post.url.clone(),
    }
}

fn summarize(post: &Post) -> String {
    let caption = post.caption.split_whitespace().collect::<Vec<_>>().join(" ");
    if caption.is_empty() {
        return post.url.clone();
    }
    if caption.chars().count() <= SUMMARY_MAX_CHARS {
        return caption;
    }
    let mut summary: String = caption.chars().take(SUMMARY_MAX_CHARS - 1).collect();
    summary.push('…');
    summary
}

#[cfg(test)]
#[path = "trends_test.rs"]
mod tests;
