//! Per-brand metric aggregation.

use std::collections::BTreeMap;

use crate::types::{BrandMetrics, GlobalTotals, Post};

/// Output of one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    /// Keyed by brand so iteration order is deterministic.
    pub brands: BTreeMap<String, BrandMetrics>,
    pub totals: GlobalTotals,
}

#[derive(Debug, Default)]
struct BrandAccumulator {
    posts: u64,
    likes: u64,
    comments: u64,
    shares: u64,
    views: u64,
    followers: Option<u64>,
}

impl BrandAccumulator {
    fn add(&mut self, post: &Post) {
        self.posts += 1;
        self.likes = self.likes.saturating_add(post.likes);
        self.comments = self.comments.saturating_add(post.comments);
        self.shares = self.shares.saturating_add(post.shares);
        self.views = self.views.saturating_add(post.views);
        if let Some(followers) = post.followers_estimate {
            self.followers = Some(self.followers.map_or(followers, |f| f.max(followers)));
        }
    }

    fn finish(self, brand: String) -> BrandMetrics {
        // Accumulators only exist once a post has been added.
        #[allow(clippy::cast_precision_loss)]
        let avg_engagement = if self.posts > 0 {
            self.likes.saturating_add(self.comments) as f64 / self.posts as f64
        } else {
            0.0
        };

        #[allow(clippy::cast_precision_loss)]
        let engagement_rate = self
            .followers
            .filter(|&f| f > 0)
            .map(|f| avg_engagement / f as f64 * 100.0);

        BrandMetrics {
            brand,
            posts: self.posts,
            total_likes: self.likes,
            total_comments: self.comments,
            total_shares: self.shares,
            total_views: self.views,
            avg_engagement,
            engagement_rate,
            followers_estimate: self.followers,
            share_of_voice: 0.0,
            rank: 0,
        }
    }
}

/// Group attributed posts by brand and compute totals and averages.
///
/// Single pass. `share_of_voice` and `rank` are left at zero for the ranker.
pub fn aggregate<'a, I>(posts: I) -> Aggregation
where
    I: IntoIterator<Item = &'a Post>,
{
    let mut accumulators: BTreeMap<String, BrandAccumulator> = BTreeMap::new();
    let mut totals = GlobalTotals::default();

    for post in posts {
        totals.posts += 1;
        totals.likes = totals.likes.saturating_add(post.likes);
        totals.comments = totals.comments.saturating_add(post.comments);
        totals.shares = totals.shares.saturating_add(post.shares);
        totals.views = totals.views.saturating_add(post.views);

        accumulators
            .entry(post.brand.clone())
            .or_default()
            .add(post);
    }

    totals.brands = u64::try_from(accumulators.len()).unwrap_or(u64::MAX);

    let brands = accumulators
        .into_iter()
        .map(|(brand, acc)| {
            let metrics = acc.finish(brand.clone());
            (brand, metrics)
        })
        .collect();

    Aggregation { brands, totals }
}
