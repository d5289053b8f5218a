//! Competitive social-media analysis for brandpulse.
//!
//! Turns raw scrape dumps (Instagram posts, hashtag-search posts, TikTok
//! videos) into per-brand engagement rankings, hashtag velocity, viral
//! "cultural moments" and rule-based recommendations for a home brand.
//!
//! The crate is a pure, synchronous batch computation: [`analyze`] takes the
//! raw records and a frozen [`AnalysisConfig`] and returns an owned
//! [`AnalysisResult`]. It performs no I/O and keeps no global state.

pub mod aggregate;
pub mod attribute;
pub mod config;
pub mod error;
pub mod insights;
pub mod normalize;
pub mod pipeline;
pub mod rank;
pub mod trends;
pub mod types;

pub use attribute::{attribute, BrandDirectory, UNKNOWN_BRAND};
pub use config::AnalysisConfig;
pub use error::{AnalysisError, SkipReason};
pub use normalize::{normalize_record, normalize_records, PostStream, SkipCounts};
pub use pipeline::{analyze, rank, rank_with_directory};
pub use types::{
    AnalysisResult, BrandMetrics, CulturalMoment, HashtagMetrics, Platform, Post, Priority,
    RawRecord, Recommendation,
};
