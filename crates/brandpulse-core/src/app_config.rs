use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Per-platform engagement level above which a single post counts as viral.
///
/// Signed so that a misconfigured negative value survives parsing and is
/// rejected by analysis-time validation with a descriptive error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViralThresholds {
    pub instagram: i64,
    pub hashtag: i64,
    pub tiktok: i64,
}

impl Default for ViralThresholds {
    fn default() -> Self {
        Self {
            instagram: 1_000,
            hashtag: 1_000,
            tiktok: 10_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub brands_path: PathBuf,
    /// Overrides the watch-list's `home` brand when set.
    pub home_brand: Option<String>,
    pub trend_window_days: i64,
    pub viral_thresholds: ViralThresholds,
    pub min_posts_per_window: u64,
    pub max_cultural_moments: usize,
    pub engagement_gap_fraction: f64,
    pub critical_gap_multiple: f64,
    pub trend_velocity_threshold: f64,
}
