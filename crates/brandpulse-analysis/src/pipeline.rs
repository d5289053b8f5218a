//! Pipeline orchestration.

use crate::aggregate::aggregate;
use crate::attribute::BrandDirectory;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::insights::{generate_recommendations, InsightContext};
use crate::normalize::normalize_records;
use crate::rank::rank_brands;
use crate::trends::{detect_cultural_moments, hashtag_trends, TrendWindow};
use crate::types::{AnalysisResult, BrandMetrics, Post, RawRecord};

/// Run the full analysis over one batch of raw records.
///
/// 1. Validate the config.
/// 2. Normalize and attribute records, counting the ones that are skipped.
/// 3. Aggregate per-brand metrics and rank them.
/// 4. Compute hashtag velocity and detect cultural moments.
/// 5. Evaluate the recommendation rules for the home brand.
///
/// The result depends only on `records` and `config`.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidConfig`] before touching any record if the
/// config is invalid. Bad records never fail the run.
pub fn analyze<I>(records: I, config: &AnalysisConfig) -> Result<AnalysisResult, AnalysisError>
where
    I: IntoIterator,
    I::Item: Into<RawRecord>,
{
    config.validate()?;

    let (posts, skipped) = collect_posts(records, &config.directory);

    let aggregation = aggregate(&posts);
    let total_posts = aggregation.totals.posts;
    let brand_metrics = rank_brands(aggregation);

    let window = TrendWindow::resolve(&posts, config.as_of, config.trend_window_days);
    if window.is_none() && !posts.is_empty() {
        tracing::debug!("no post timestamps and no as_of; hashtag velocity will be zero");
    }
    let hashtag_trends = hashtag_trends(&posts, window.as_ref());

    let all_moments = detect_cultural_moments(&posts, config);

    let recommendations = generate_recommendations(&InsightContext {
        ranked: &brand_metrics,
        trends: &hashtag_trends,
        moments: &all_moments,
        posts: &posts,
        window: window.as_ref(),
        config,
    });

    let mut cultural_moments = all_moments;
    cultural_moments.truncate(config.max_cultural_moments);

    tracing::info!(
        home_brand = %config.home_brand,
        posts = total_posts,
        skipped,
        brands = brand_metrics.len(),
        hashtags = hashtag_trends.len(),
        moments = cultural_moments.len(),
        recommendations = recommendations.len(),
        "analysis complete"
    );

    Ok(AnalysisResult {
        brand_metrics,
        hashtag_trends,
        cultural_moments,
        recommendations,
        skipped_record_count: skipped,
        total_posts,
    })
}

/// Rank brands by engagement without the trend and insight stages.
#[must_use]
pub fn rank<I>(records: I) -> Vec<BrandMetrics>
where
    I: IntoIterator,
    I::Item: Into<RawRecord>,
{
    rank_with_directory(records, &BrandDirectory::default())
}

/// [`rank`], with brand identities canonicalised through `directory`.
#[must_use]
pub fn rank_with_directory<I>(records: I, directory: &BrandDirectory) -> Vec<BrandMetrics>
where
    I: IntoIterator,
    I::Item: Into<RawRecord>,
{
    let (posts, _) = collect_posts(records, directory);
    rank_brands(aggregate(&posts))
}

fn collect_posts<I>(records: I, directory: &BrandDirectory) -> (Vec<Post>, u64)
where
    I: IntoIterator,
    I::Item: Into<RawRecord>,
{
    let mut stream = normalize_records(records, directory);
    let posts: Vec<Post> = stream.by_ref().collect();
    let counts = stream.skip_counts();

    if posts.is_empty() && counts.total() > 0 {
        tracing::warn!(skipped = counts.total(), "every raw record was skipped");
    } else if counts.total() > 0 {
        tracing::debug!(
            malformed = counts.malformed,
            not_an_object = counts.not_an_object,
            unrecognized = counts.unrecognized,
            "skipped raw records"
        );
    }

    (posts, counts.total())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::attribute::UNKNOWN_BRAND;

    #[test]
    fn invalid_config_rejected_before_processing() {
        let mut config = AnalysisConfig::new("Glow Lab");
        config.trend_window_days = 0;
        let result = analyze(vec![r#"{"ownerUsername": "acme"}"#], &config);
        assert!(matches!(result, Err(AnalysisError::InvalidConfig(_))));
    }

    #[test]
    fn empty_input_yields_empty_result() {
        let config = AnalysisConfig::new("Glow Lab");
        let result = analyze(Vec::<RawRecord>::new(), &config).unwrap();
        assert!(result.brand_metrics.is_empty());
        assert!(result.hashtag_trends.is_empty());
        assert!(result.cultural_moments.is_empty());
        assert_eq!(result.skipped_record_count, 0);
        assert_eq!(result.total_posts, 0);
        // Home brand has no posts, so only the cadence rule can fire.
        assert_eq!(result.recommendations.len(), 1);
        assert_eq!(result.recommendations[0].title, "Increase posting cadence");
    }

    #[test]
    fn cultural_moments_truncated_but_rules_see_all() {
        let mut config = AnalysisConfig::new("Glow Lab");
        config.max_cultural_moments = 1;
        config.min_posts_per_window = 0;
        let records = vec![
            json!({"ownerUsername": "lumen", "likesCount": 5000}),
            json!({"ownerUsername": "dewdrop", "likesCount": 4000}),
            json!({"ownerUsername": "glow lab", "likesCount": 9000}),
        ];
        let result = analyze(records, &config).unwrap();
        assert_eq!(result.cultural_moments.len(), 1);
        assert_eq!(result.cultural_moments[0].brand_or_author, "glow lab");
        assert!(result
            .recommendations
            .iter()
            .all(|r| r.title != "Competitors are owning viral moments"));
    }

    #[test]
    fn rank_ignores_config_and_skips_bad_lines() {
        let ranked = rank(vec![
            r#"{"ownerUsername": "acme", "likesCount": 10}"#,
            "{oops",
            r#"{"ownerUsername": "zenith", "likesCount": 30}"#,
        ]);
        let brands: Vec<&str> = ranked.iter().map(|b| b.brand.as_str()).collect();
        assert_eq!(brands, vec!["zenith", "acme"]);
    }

    #[test]
    fn rank_with_directory_merges_handles_of_one_brand() {
        let brands = brandpulse_core::parse_brands(
            "brands:\n  - name: Acme\n    relationship: home\n    handles: ['@acme', 'acme.tt']\n",
        )
        .unwrap();
        let directory = BrandDirectory::from_brands(&brands);
        let ranked = rank_with_directory(
            vec![
                r#"{"ownerUsername": "acme", "likesCount": 10}"#,
                r#"{"authorMeta": {"name": "acme.tt"}, "diggCount": 30}"#,
            ],
            &directory,
        );
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].brand, "Acme");
        assert_eq!(ranked[0].posts, 2);
    }

    #[test]
    fn hashtag_search_records_feed_trends_without_caption_tags() {
        let result = analyze(
            vec![r#"{"hashtag":"drop","ownerUsername":"fan","likesCount":5,"caption":"love it"}"#],
            &AnalysisConfig::new("Glow Lab"),
        )
        .unwrap();
        assert_eq!(result.hashtag_trends.len(), 1);
        assert_eq!(result.hashtag_trends[0].tag, "drop");
        assert_eq!(result.hashtag_trends[0].posts, 1);
    }

    #[test]
    fn cadence_counts_home_posts_in_current_window_only() {
        let mut records: Vec<String> = (1..=6)
            .map(|day| {
                format!(
                    r#"{{"ownerUsername":"glowlab","likesCount":10,"timestamp":"2024-01-{day:02}T12:00:00Z"}}"#
                )
            })
            .collect();
        records.push(
            r#"{"ownerUsername":"lumen","likesCount":10,"timestamp":"2024-03-30T12:00:00Z"}"#
                .to_string(),
        );

        let result = analyze(records, &AnalysisConfig::new("glowlab")).unwrap();
        let cadence = result
            .recommendations
            .iter()
            .find(|r| r.title == "Increase posting cadence")
            .expect("home brand went quiet in the current window");
        assert!(cadence.description.contains("published 0 post(s)"));
        assert!((cadence.signal - 5.0).abs() < 1e-9);
    }

    #[test]
    fn gap_rule_never_names_the_unknown_bucket() {
        let records = vec![
            r#"{"url":"https://www.instagram.com/p/orphan/","likesCount":900}"#,
            r#"{"ownerUsername":"rival","likesCount":100}"#,
            r#"{"ownerUsername":"home","likesCount":10}"#,
        ];
        let result = analyze(records, &AnalysisConfig::new("home")).unwrap();
        assert_eq!(result.brand_metrics[0].brand, UNKNOWN_BRAND);
        let gap = result
            .recommendations
            .iter()
            .find(|r| r.title == "Close the engagement gap")
            .unwrap();
        assert!(gap.description.starts_with("rival averages 10.0x"));
        assert!(!gap.action.contains(UNKNOWN_BRAND));
    }
}
