use std::collections::BTreeSet;

use super::*;
use crate::types::Platform;

fn at(day: &str) -> DateTime<Utc> {
    format!("{day}T12:00:00Z").parse().unwrap()
}

fn dated_post(brand: &str, day: &str) -> Post {
    Post {
        platform: Platform::Instagram,
        brand: brand.to_string(),
        owner: Some(brand.to_string()),
        timestamp: Some(at(day)),
        likes: 10,
        comments: 0,
        shares: 0,
        views: 0,
        caption: String::new(),
        hashtags: BTreeSet::new(),
        url: String::new(),
        followers_estimate: None,
    }
}

fn dated_moment(brand: &str, day: &str) -> CulturalMoment {
    CulturalMoment {
        timestamp: Some(at(day)),
        ..moment(brand, 5_000)
    }
}

fn metrics(brand: &str, rank: u64, posts: u64, avg: f64) -> BrandMetrics {
    BrandMetrics {
        brand: brand.to_string(),
        posts,
        total_likes: 0,
        total_comments: 0,
        total_shares: 0,
        total_views: 0,
        avg_engagement: avg,
        engagement_rate: None,
        followers_estimate: None,
        share_of_voice: 0.0,
        rank,
    }
}

fn trend(tag: &str, velocity: f64) -> HashtagMetrics {
    HashtagMetrics {
        tag: tag.to_string(),
        posts: 10,
        avg_engagement: 50.0,
        current_window_posts: 8,
        prior_window_posts: 2,
        velocity,
    }
}

fn moment(brand: &str, engagement: u64) -> CulturalMoment {
    CulturalMoment {
        brand_or_author: brand.to_string(),
        summary: "big post".to_string(),
        engagement,
        timestamp: None,
        labels: BTreeSet::new(),
        platform: Platform::Instagram,
        url: String::new(),
    }
}

fn config() -> AnalysisConfig {
    let mut config = AnalysisConfig::new("Glow Lab");
    config.min_posts_per_window = 3;
    config
}

fn run(
    ranked: &[BrandMetrics],
    trends: &[HashtagMetrics],
    moments: &[CulturalMoment],
    config: &AnalysisConfig,
) -> Vec<Recommendation> {
    generate_recommendations(&InsightContext {
        ranked,
        trends,
        moments,
        posts: &[],
        window: None,
        config,
    })
}

fn run_windowed(
    ranked: &[BrandMetrics],
    moments: &[CulturalMoment],
    posts: &[Post],
    window: &TrendWindow,
    config: &AnalysisConfig,
) -> Vec<Recommendation> {
    generate_recommendations(&InsightContext {
        ranked,
        trends: &[],
        moments,
        posts,
        window: Some(window),
        config,
    })
}

fn titles(recs: &[Recommendation]) -> Vec<&str> {
    recs.iter().map(|r| r.title.as_str()).collect()
}

// -----------------------------------------------------------------------
// engagement gap
// -----------------------------------------------------------------------

#[test]
fn gap_rule_fires_when_home_is_in_bottom_half() {
    let ranked = vec![
        metrics("Lumen", 1, 5, 500.0),
        metrics("Dewdrop", 2, 5, 400.0),
        metrics("Glow Lab", 3, 5, 200.0),
    ];
    let recs = run(&ranked, &[], &[], &config());
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].title, "Close the engagement gap");
    assert_eq!(recs[0].priority, Priority::High);
    assert!((recs[0].signal - 2.5).abs() < 1e-9);
    assert!(recs[0].description.contains("2.5x"));
    assert!(recs[0].description.contains("ranks 3 of 3"));
}

#[test]
fn gap_rule_is_critical_at_large_multiple() {
    let ranked = vec![
        metrics("Lumen", 1, 5, 900.0),
        metrics("Glow Lab", 2, 5, 100.0),
    ];
    let recs = run(&ranked, &[], &[], &config());
    assert_eq!(recs[0].priority, Priority::Critical);
    assert!((recs[0].signal - 9.0).abs() < 1e-9);
}

#[test]
fn gap_rule_is_critical_when_home_has_no_engagement() {
    let ranked = vec![
        metrics("Lumen", 1, 5, 120.0),
        metrics("Glow Lab", 2, 5, 0.0),
    ];
    let recs = run(&ranked, &[], &[], &config());
    assert_eq!(recs[0].priority, Priority::Critical);
    assert!((recs[0].signal - 120.0).abs() < 1e-9);
    assert!(recs[0].description.contains("has recorded none"));
}

#[test]
fn gap_rule_silent_inside_top_half() {
    let ranked = vec![
        metrics("Lumen", 1, 5, 500.0),
        metrics("Glow Lab", 2, 5, 400.0),
        metrics("Dewdrop", 3, 5, 100.0),
    ];
    // ceil(3 * 0.5) = 2, rank 2 is inside.
    assert!(run(&ranked, &[], &[], &config()).is_empty());
}

#[test]
fn gap_rule_matches_home_case_insensitively() {
    let ranked = vec![
        metrics("Lumen", 1, 5, 500.0),
        metrics("glow lab", 2, 5, 100.0),
    ];
    assert_eq!(
        titles(&run(&ranked, &[], &[], &config())),
        vec!["Close the engagement gap"]
    );
}

#[test]
fn gap_rule_quotes_best_real_competitor_not_unknown() {
    let ranked = vec![
        metrics(UNKNOWN_BRAND, 1, 1, 900.0),
        metrics("Lumen", 2, 1, 100.0),
        metrics("Glow Lab", 3, 5, 10.0),
    ];
    let recs = run(&ranked, &[], &[], &config());
    assert_eq!(titles(&recs), vec!["Close the engagement gap"]);
    assert!((recs[0].signal - 10.0).abs() < 1e-9);
    assert!(recs[0].description.starts_with("Lumen averages 10.0x"));
    assert!(recs[0].action.contains("Audit Lumen's"));
    assert!(!recs[0].description.contains(UNKNOWN_BRAND));
}

#[test]
fn gap_rule_silent_when_only_unknown_outranks_home() {
    let ranked = vec![
        metrics(UNKNOWN_BRAND, 1, 1, 900.0),
        metrics("Glow Lab", 2, 5, 10.0),
    ];
    assert!(run(&ranked, &[], &[], &config()).is_empty());
}

#[test]
fn home_brand_matches_non_ascii_case_insensitively() {
    let ranked = vec![metrics("ÉLAN", 1, 5, 500.0)];
    let mut config = config();
    config.home_brand = "élan".to_string();
    let moments = vec![moment("Lumen", 9_000), moment("Élan", 2_000)];
    assert!(run(&ranked, &[], &moments, &config).is_empty());
}

// -----------------------------------------------------------------------
// low frequency
// -----------------------------------------------------------------------

#[test]
fn low_frequency_counts_only_posts_in_current_window() {
    let mut posts: Vec<Post> = (1..=6)
        .map(|day| dated_post("Glow Lab", &format!("2024-01-{day:02}")))
        .collect();
    posts.push(dated_post("Lumen", "2024-03-30"));
    let ranked = vec![
        metrics("Glow Lab", 1, 6, 10.0),
        metrics("Lumen", 2, 1, 10.0),
    ];
    let window = TrendWindow::new(at("2024-03-30"), 7);

    let recs = run_windowed(&ranked, &[], &posts, &window, &config());
    assert_eq!(titles(&recs), vec!["Increase posting cadence"]);
    assert!((recs[0].signal - 3.0).abs() < 1e-9);
    assert!(recs[0].description.contains("published 0 post(s)"));
}

#[test]
fn low_frequency_silent_with_enough_recent_posts() {
    let posts: Vec<Post> = (24..=26)
        .map(|day| dated_post("glow lab", &format!("2024-03-{day:02}")))
        .collect();
    let ranked = vec![metrics("glow lab", 1, 3, 10.0)];
    let window = TrendWindow::new(at("2024-03-30"), 7);
    assert!(run_windowed(&ranked, &[], &posts, &window, &config()).is_empty());
}

#[test]
fn low_frequency_fires_below_minimum() {
    let ranked = vec![metrics("Glow Lab", 1, 1, 500.0)];
    let recs = run(&ranked, &[], &[], &config());
    assert_eq!(titles(&recs), vec!["Increase posting cadence"]);
    assert_eq!(recs[0].priority, Priority::Medium);
    assert!((recs[0].signal - 2.0).abs() < 1e-9);
}

#[test]
fn low_frequency_fires_when_home_absent() {
    let ranked = vec![metrics("Lumen", 1, 9, 500.0)];
    let recs = run(&ranked, &[], &[], &config());
    assert_eq!(titles(&recs), vec!["Increase posting cadence"]);
    assert!((recs[0].signal - 3.0).abs() < 1e-9);
    assert!(recs[0].description.contains("published 0 post(s)"));
}

#[test]
fn low_frequency_silent_at_minimum() {
    let ranked = vec![metrics("Glow Lab", 1, 3, 500.0)];
    assert!(run(&ranked, &[], &[], &config()).is_empty());
}

// -----------------------------------------------------------------------
// trend opportunity
// -----------------------------------------------------------------------

#[test]
fn trend_rule_fires_above_threshold() {
    let ranked = vec![metrics("Glow Lab", 1, 5, 500.0)];
    let recs = run(&ranked, &[trend("drop", 300.0), trend("glow", 80.0)], &[], &config());
    assert_eq!(titles(&recs), vec!["Create content around #drop"]);
    assert_eq!(recs[0].priority, Priority::High);
    assert!((recs[0].signal - 300.0).abs() < 1e-9);
}

#[test]
fn trend_rule_silent_at_threshold() {
    let ranked = vec![metrics("Glow Lab", 1, 5, 500.0)];
    assert!(run(&ranked, &[trend("drop", 50.0)], &[], &config()).is_empty());
}

// -----------------------------------------------------------------------
// viral moments
// -----------------------------------------------------------------------

#[test]
fn viral_rule_fires_when_only_competitors_went_viral() {
    let ranked = vec![metrics("Glow Lab", 1, 5, 500.0)];
    let moments = vec![
        moment("Lumen", 9_000),
        moment("Dewdrop", 5_000),
        moment("Lumen", 4_000),
        moment(UNKNOWN_BRAND, 3_000),
    ];
    let recs = run(&ranked, &[], &moments, &config());
    assert_eq!(titles(&recs), vec!["Competitors are owning viral moments"]);
    assert!((recs[0].signal - 3.0).abs() < 1e-9);
    assert!(recs[0].description.contains("(Lumen, Dewdrop)"));
}

#[test]
fn viral_rule_silent_when_home_also_went_viral() {
    let ranked = vec![metrics("Glow Lab", 1, 5, 500.0)];
    let moments = vec![moment("Lumen", 9_000), moment("GLOW LAB", 2_000)];
    assert!(run(&ranked, &[], &moments, &config()).is_empty());
}

#[test]
fn viral_rule_ignores_unknown_authors() {
    let ranked = vec![metrics("Glow Lab", 1, 5, 500.0)];
    let moments = vec![moment(UNKNOWN_BRAND, 9_000)];
    assert!(run(&ranked, &[], &moments, &config()).is_empty());
}

#[test]
fn viral_rule_ignores_moments_before_current_window() {
    let posts: Vec<Post> = (24..=26)
        .map(|day| dated_post("Glow Lab", &format!("2024-03-{day:02}")))
        .collect();
    let ranked = vec![metrics("Glow Lab", 1, 3, 10.0)];
    let window = TrendWindow::new(at("2024-03-30"), 7);
    let moments = vec![dated_moment("Lumen", "2024-01-15")];
    assert!(run_windowed(&ranked, &moments, &posts, &window, &config()).is_empty());
}

#[test]
fn old_home_moment_does_not_silence_recent_competitor_moment() {
    let posts: Vec<Post> = (24..=26)
        .map(|day| dated_post("Glow Lab", &format!("2024-03-{day:02}")))
        .collect();
    let ranked = vec![metrics("Glow Lab", 1, 3, 10.0)];
    let window = TrendWindow::new(at("2024-03-30"), 7);
    let moments = vec![
        dated_moment("Lumen", "2024-03-29"),
        dated_moment("Glow Lab", "2024-01-15"),
    ];
    let recs = run_windowed(&ranked, &moments, &posts, &window, &config());
    assert_eq!(titles(&recs), vec!["Competitors are owning viral moments"]);
    assert!((recs[0].signal - 1.0).abs() < 1e-9);
}

// -----------------------------------------------------------------------
// ordering
// -----------------------------------------------------------------------

#[test]
fn recommendations_order_by_priority_then_signal() {
    let ranked = vec![
        metrics("Lumen", 1, 9, 900.0),
        metrics("Dewdrop", 2, 9, 500.0),
        metrics("Glow Lab", 3, 1, 100.0),
    ];
    let trends = vec![trend("drop", 300.0)];
    let moments = vec![moment("Lumen", 9_000)];

    let recs = run(&ranked, &trends, &moments, &config());
    let priorities: Vec<Priority> = recs.iter().map(|r| r.priority).collect();
    assert_eq!(
        priorities,
        vec![
            Priority::Critical,
            Priority::High,
            Priority::Medium,
            Priority::Medium
        ]
    );
    // Medium ties break on signal: shortfall 2 beats one viral moment.
    assert_eq!(
        titles(&recs),
        vec![
            "Close the engagement gap",
            "Create content around #drop",
            "Increase posting cadence",
            "Competitors are owning viral moments",
        ]
    );
}

#[test]
fn equal_priority_orders_by_signal_descending() {
    let ranked = vec![
        metrics("Lumen", 1, 9, 250.0),
        metrics("Glow Lab", 2, 9, 100.0),
    ];
    // Gap 2.5x (High) vs trend 60% (High): the larger signal leads.
    let recs = run(&ranked, &[trend("glow", 60.0)], &[], &config());
    assert_eq!(
        titles(&recs),
        vec!["Create content around #glow", "Close the engagement gap"]
    );
}
