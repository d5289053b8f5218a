use std::collections::BTreeMap;

use brandpulse_core::{AppConfig, ViralThresholds};
use chrono::{DateTime, Utc};

use crate::attribute::BrandDirectory;
use crate::error::AnalysisError;
use crate::types::Platform;

/// Tunable thresholds for one analysis run.
///
/// Treated as frozen for the duration of a run; several runs may share one
/// config by reference.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Engagement a single post must strictly exceed to count as viral.
    /// Platforms missing from the map fall back to the built-in defaults.
    pub viral_threshold_by_platform: BTreeMap<Platform, i64>,
    pub trend_window_days: i64,
    /// Brand the recommendations are written for; matched case-insensitively.
    pub home_brand: String,
    pub min_posts_per_window: u64,
    pub max_cultural_moments: usize,
    /// Home brand ranked outside the top `ceil(N * fraction)` brands
    /// triggers the engagement-gap rule.
    pub engagement_gap_fraction: f64,
    /// Leader-to-home engagement multiple at which the gap becomes critical.
    pub critical_gap_multiple: f64,
    /// Top-hashtag velocity (percent) above which a trend is worth chasing.
    pub trend_velocity_threshold: f64,
    /// End of the current trend window. Defaults to the newest post
    /// timestamp in the run so results never depend on the wall clock.
    pub as_of: Option<DateTime<Utc>>,
    pub directory: BrandDirectory,
}

impl AnalysisConfig {
    /// Config with default thresholds for the given home brand.
    #[must_use]
    pub fn new(home_brand: impl Into<String>) -> Self {
        Self {
            viral_threshold_by_platform: thresholds_from(&ViralThresholds::default()),
            trend_window_days: 7,
            home_brand: home_brand.into(),
            min_posts_per_window: 5,
            max_cultural_moments: 10,
            engagement_gap_fraction: 0.5,
            critical_gap_multiple: 3.0,
            trend_velocity_threshold: 50.0,
            as_of: None,
            directory: BrandDirectory::default(),
        }
    }

    /// Config whose thresholds come from the environment-driven [`AppConfig`].
    #[must_use]
    pub fn from_app_config(app: &AppConfig, home_brand: impl Into<String>) -> Self {
        Self {
            viral_threshold_by_platform: thresholds_from(&app.viral_thresholds),
            trend_window_days: app.trend_window_days,
            min_posts_per_window: app.min_posts_per_window,
            max_cultural_moments: app.max_cultural_moments,
            engagement_gap_fraction: app.engagement_gap_fraction,
            critical_gap_multiple: app.critical_gap_multiple,
            trend_velocity_threshold: app.trend_velocity_threshold,
            ..Self::new(home_brand)
        }
    }

    #[must_use]
    pub fn with_directory(mut self, directory: BrandDirectory) -> Self {
        self.directory = directory;
        self
    }

    #[must_use]
    pub fn with_as_of(mut self, as_of: DateTime<Utc>) -> Self {
        self.as_of = Some(as_of);
        self
    }

    /// Reject configurations that would produce nonsensical output.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidConfig`] describing the first problem found.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.trend_window_days <= 0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "trend_window_days must be positive, got {}",
                self.trend_window_days
            )));
        }

        for (platform, threshold) in &self.viral_threshold_by_platform {
            if *threshold < 0 {
                return Err(AnalysisError::InvalidConfig(format!(
                    "viral threshold for {platform} must not be negative, got {threshold}"
                )));
            }
        }

        if self.home_brand.trim().is_empty() {
            return Err(AnalysisError::InvalidConfig(
                "home_brand must be non-empty".to_string(),
            ));
        }

        if !(self.engagement_gap_fraction > 0.0 && self.engagement_gap_fraction <= 1.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "engagement_gap_fraction must be in (0, 1], got {}",
                self.engagement_gap_fraction
            )));
        }

        if !self.critical_gap_multiple.is_finite() || self.critical_gap_multiple < 1.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "critical_gap_multiple must be a finite value >= 1, got {}",
                self.critical_gap_multiple
            )));
        }

        if !self.trend_velocity_threshold.is_finite() || self.trend_velocity_threshold < 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "trend_velocity_threshold must be a finite, non-negative percentage, got {}",
                self.trend_velocity_threshold
            )));
        }

        Ok(())
    }

    /// Viral threshold for `platform`; only meaningful after [`validate`](Self::validate).
    #[must_use]
    pub fn viral_threshold(&self, platform: Platform) -> u64 {
        let threshold = self
            .viral_threshold_by_platform
            .get(&platform)
            .copied()
            .unwrap_or_else(|| default_threshold(platform));
        u64::try_from(threshold).unwrap_or(0)
    }
}

fn default_threshold(platform: Platform) -> i64 {
    let defaults = ViralThresholds::default();
    match platform {
        Platform::Instagram => defaults.instagram,
        Platform::TikTok => defaults.tiktok,
        Platform::Hashtag => defaults.hashtag,
    }
}

fn thresholds_from(thresholds: &ViralThresholds) -> BTreeMap<Platform, i64> {
    BTreeMap::from([
        (Platform::Instagram, thresholds.instagram),
        (Platform::TikTok, thresholds.tiktok),
        (Platform::Hashtag, thresholds.hashtag),
    ])
}
