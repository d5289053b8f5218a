use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source kind of a scraped record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    TikTok,
    Hashtag,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Instagram, Platform::TikTok, Platform::Hashtag];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::TikTok => "tiktok",
            Platform::Hashtag => "hashtag",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One raw scraped entry as handed to the pipeline.
#[derive(Debug, Clone)]
pub enum RawRecord {
    /// Undecoded JSON text, typically one JSONL line.
    Text(String),
    /// An already-decoded JSON value, e.g. one element of a JSON array dump.
    Json(serde_json::Value),
}

impl From<String> for RawRecord {
    fn from(value: String) -> Self {
        RawRecord::Text(value)
    }
}

impl From<&str> for RawRecord {
    fn from(value: &str) -> Self {
        RawRecord::Text(value.to_string())
    }
}

impl From<serde_json::Value> for RawRecord {
    fn from(value: serde_json::Value) -> Self {
        RawRecord::Json(value)
    }
}

/// A scraped post normalized across platforms.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub platform: Platform,
    /// Attributed brand identity; `"Unknown"` when nothing could be inferred.
    pub brand: String,
    /// Explicit owner/username field carried by the raw record, if any.
    pub owner: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub views: u64,
    pub caption: String,
    /// Lowercase tags without the leading `#`.
    pub hashtags: BTreeSet<String>,
    pub url: String,
    pub followers_estimate: Option<u64>,
}

impl Post {
    /// Likes plus comments; the basis of average engagement.
    #[must_use]
    pub fn interactions(&self) -> u64 {
        self.likes.saturating_add(self.comments)
    }

    /// Likes, comments and shares; the basis of viral detection.
    #[must_use]
    pub fn engagement(&self) -> u64 {
        self.interactions().saturating_add(self.shares)
    }
}

/// Per-brand totals and derived engagement figures for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandMetrics {
    pub brand: String,
    pub posts: u64,
    pub total_likes: u64,
    pub total_comments: u64,
    pub total_shares: u64,
    pub total_views: u64,
    /// `(total_likes + total_comments) / posts`.
    pub avg_engagement: f64,
    /// Average engagement as a percentage of followers. `None` means no
    /// follower figure was observed, not a measured zero.
    pub engagement_rate: Option<f64>,
    /// Largest follower count observed on any of the brand's posts.
    pub followers_estimate: Option<u64>,
    /// Percentage of all attributed posts in the run.
    pub share_of_voice: f64,
    /// 1-based position after ranking; 0 until ranked.
    pub rank: u64,
}

impl BrandMetrics {
    #[must_use]
    pub fn avg_engagement_display(&self) -> String {
        format!("{:.1}", self.avg_engagement)
    }

    #[must_use]
    pub fn engagement_rate_display(&self) -> String {
        self.engagement_rate
            .map_or_else(|| "n/a".to_string(), |rate| format!("{rate:.2}%"))
    }

    #[must_use]
    pub fn share_of_voice_display(&self) -> String {
        format!("{:.1}%", self.share_of_voice)
    }
}

/// Run-wide totals across every attributed post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GlobalTotals {
    pub posts: u64,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub views: u64,
    pub brands: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HashtagMetrics {
    pub tag: String,
    /// Posts carrying the tag across the whole run.
    pub posts: u64,
    /// Mean `engagement()` of those posts.
    pub avg_engagement: f64,
    pub current_window_posts: u64,
    pub prior_window_posts: u64,
    /// Percentage change from the prior to the current window. Negative
    /// values mean the tag is declining.
    pub velocity: f64,
}

/// A single post whose engagement beat its platform's viral threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CulturalMoment {
    pub brand_or_author: String,
    pub summary: String,
    pub engagement: u64,
    pub timestamp: Option<DateTime<Utc>>,
    pub labels: BTreeSet<String>,
    pub platform: Platform,
    pub url: String,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
            Priority::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub action: String,
    /// Magnitude of the numeric signal behind the rule; orders
    /// recommendations of equal priority.
    pub signal: f64,
}

/// Everything one `analyze` call produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub brand_metrics: Vec<BrandMetrics>,
    pub hashtag_trends: Vec<HashtagMetrics>,
    pub cultural_moments: Vec<CulturalMoment>,
    pub recommendations: Vec<Recommendation>,
    pub skipped_record_count: u64,
    pub total_posts: u64,
}
