//! Markdown rendering of analysis and ranking output.

use std::fmt;

use brandpulse_analysis::{AnalysisResult, BrandMetrics};

/// Full markdown report for one home brand.
pub(crate) struct AnalysisReport<'a> {
    pub home_brand: &'a str,
    pub result: &'a AnalysisResult,
}

/// Markdown table of ranked brand metrics.
pub(crate) struct RankingTable<'a>(pub &'a [BrandMetrics]);

impl fmt::Display for AnalysisReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.result;

        writeln!(f, "# Competitive Report: {}", cell(self.home_brand))?;
        writeln!(f)?;
        writeln!(f, "**Posts analyzed**: {}", result.total_posts)?;
        writeln!(f, "**Records skipped**: {}", result.skipped_record_count)?;
        writeln!(f, "**Brands**: {}", result.brand_metrics.len())?;
        writeln!(f)?;

        writeln!(f, "## Brand Ranking")?;
        writeln!(f)?;
        if result.brand_metrics.is_empty() {
            writeln!(f, "_No attributable posts._")?;
        } else {
            write!(f, "{}", RankingTable(&result.brand_metrics))?;
        }
        writeln!(f)?;

        writeln!(f, "## Hashtag Trends")?;
        writeln!(f)?;
        if result.hashtag_trends.is_empty() {
            writeln!(f, "_No hashtags found._")?;
        } else {
            writeln!(f, "| Tag | Posts | Avg Engagement | Prior | Current | Velocity |")?;
            writeln!(f, "|-----|-------|----------------|-------|---------|----------|")?;
            for trend in &result.hashtag_trends {
                writeln!(
                    f,
                    "| #{} | {} | {:.1} | {} | {} | {:+.0}% |",
                    cell(&trend.tag),
                    trend.posts,
                    trend.avg_engagement,
                    trend.prior_window_posts,
                    trend.current_window_posts,
                    trend.velocity
                )?;
            }
        }
        writeln!(f)?;

        writeln!(f, "## Cultural Moments")?;
        writeln!(f)?;
        if result.cultural_moments.is_empty() {
            writeln!(f, "_No posts crossed a viral threshold._")?;
        } else {
            writeln!(f, "| Brand / Author | Platform | Engagement | Posted | Summary |")?;
            writeln!(f, "|----------------|----------|------------|--------|---------|")?;
            for moment in &result.cultural_moments {
                let posted = moment.timestamp.map_or_else(
                    || "unknown".to_string(),
                    |ts| ts.format("%Y-%m-%d %H:%M UTC").to_string(),
                );
                writeln!(
                    f,
                    "| {} | {} | {} | {} | {} |",
                    cell(&moment.brand_or_author),
                    moment.platform,
                    moment.engagement,
                    posted,
                    cell(&moment.summary)
                )?;
            }
        }
        writeln!(f)?;

        writeln!(f, "## Recommendations")?;
        writeln!(f)?;
        if result.recommendations.is_empty() {
            writeln!(f, "_Nothing to flag._")?;
        }
        for (i, rec) in result.recommendations.iter().enumerate() {
            writeln!(f, "{}. **[{}] {}**", i + 1, rec.priority, rec.title)?;
            writeln!(f, "   {}", rec.description)?;
            writeln!(f, "   _Action_: {}", rec.action)?;
        }

        Ok(())
    }
}

impl fmt::Display for RankingTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "| Rank | Brand | Posts | Avg Engagement | Engagement Rate | Share of Voice |"
        )?;
        writeln!(
            f,
            "|------|-------|-------|----------------|-----------------|----------------|"
        )?;
        for m in self.0 {
            writeln!(
                f,
                "| {} | {} | {} | {} | {} | {} |",
                m.rank,
                cell(&m.brand),
                m.posts,
                m.avg_engagement_display(),
                m.engagement_rate_display(),
                m.share_of_voice_display()
            )?;
        }
        Ok(())
    }
}

/// Keep free text from breaking a table row.
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}
