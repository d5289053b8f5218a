//! Competitive ranking and share of voice.

use std::cmp::Ordering;

use crate::aggregate::Aggregation;
use crate::types::BrandMetrics;

/// Order brands and assign `rank` 1..N and `share_of_voice`.
///
/// Highest average engagement first; ties go to the brand with more posts,
/// then to the alphabetically earlier name.
#[must_use]
pub fn rank_brands(aggregation: Aggregation) -> Vec<BrandMetrics> {
    let total_posts = aggregation.totals.posts;
    let mut ranked: Vec<BrandMetrics> = aggregation.brands.into_values().collect();
    ranked.sort_by(compare_brands);

    for (position, metrics) in ranked.iter_mut().enumerate() {
        metrics.rank = u64::try_from(position + 1).unwrap_or(u64::MAX);
        metrics.share_of_voice = share_of_voice(metrics.posts, total_posts);
    }

    ranked
}

fn compare_brands(a: &BrandMetrics, b: &BrandMetrics) -> Ordering {
    b.avg_engagement
        .total_cmp(&a.avg_engagement)
        .then_with(|| b.posts.cmp(&a.posts))
        .then_with(|| a.brand.cmp(&b.brand))
}

/// Percentage of all posts that belong to one brand; 0 when there are none.
#[must_use]
pub fn share_of_voice(posts: u64, total_posts: u64) -> f64 {
    if total_posts == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let share = posts as f64 / total_posts as f64 * 100.0;
    share
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::types::GlobalTotals;

    fn metrics(brand: &str, posts: u64, avg: f64) -> BrandMetrics {
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
            rank: 0,
        }
    }

    fn aggregation(brands: Vec<BrandMetrics>) -> Aggregation {
        let posts = brands.iter().map(|b| b.posts).sum();
        let count = brands.len() as u64;
        Aggregation {
            brands: brands
                .into_iter()
                .map(|b| (b.brand.clone(), b))
                .collect::<BTreeMap<_, _>>(),
            totals: GlobalTotals {
                posts,
                brands: count,
                ..GlobalTotals::default()
            },
        }
    }

    fn order(ranked: &[BrandMetrics]) -> Vec<(&str, u64)> {
        ranked.iter().map(|b| (b.brand.as_str(), b.rank)).collect()
    }

    #[test]
    fn higher_average_ranks_first() {
        let ranked = rank_brands(aggregation(vec![
            metrics("Acme", 3, 100.0),
            metrics("Zenith", 3, 300.0),
            metrics("Lumen", 3, 200.0),
        ]));
        assert_eq!(order(&ranked), vec![("Zenith", 1), ("Lumen", 2), ("Acme", 3)]);
    }

    #[test]
    fn equal_average_breaks_on_post_count() {
        let ranked = rank_brands(aggregation(vec![
            metrics("Acme", 3, 220.0),
            metrics("Zenith", 5, 220.0),
        ]));
        assert_eq!(order(&ranked), vec![("Zenith", 1), ("Acme", 2)]);
    }

    #[test]
    fn full_tie_breaks_on_name() {
        let ranked = rank_brands(aggregation(vec![
            metrics("Zenith", 2, 50.0),
            metrics("Acme", 2, 50.0),
        ]));
        assert_eq!(order(&ranked), vec![("Acme", 1), ("Zenith", 2)]);
    }

    #[test]
    fn share_of_voice_sums_to_one_hundred() {
        let ranked = rank_brands(aggregation(vec![
            metrics("Acme", 1, 10.0),
            metrics("Zenith", 2, 10.0),
            metrics("Lumen", 4, 10.0),
        ]));
        let sum: f64 = ranked.iter().map(|b| b.share_of_voice).sum();
        assert!((sum - 100.0).abs() < 1e-9, "sum was {sum}");
        assert!((ranked[0].share_of_voice - 400.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn share_of_voice_with_no_posts_is_zero() {
        assert!(share_of_voice(0, 0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_aggregation_ranks_nothing() {
        assert!(rank_brands(Aggregation::default()).is_empty());
    }
}
