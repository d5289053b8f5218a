mod input;
mod report;

use std::path::{Path, PathBuf};

use anyhow::Context;
use brandpulse_analysis::{
    analyze, rank_with_directory, AnalysisConfig, AnalysisResult, BrandDirectory, RawRecord,
};
use brandpulse_core::{load_brands, AppConfig, BrandsFile};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::report::{AnalysisReport, RankingTable};

#[derive(Debug, Parser)]
#[command(name = "brandpulse")]
#[command(about = "Competitive social-media analysis over scrape dumps")]
struct Cli {
    /// Brand watch-list to use instead of `BRANDPULSE_BRANDS_PATH`
    #[arg(long, global = true)]
    brands: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Rank brands, detect trends and viral moments, and recommend actions
    Analyze {
        /// JSONL or JSON-array scrape dump (`-` reads stdin)
        #[arg(long, short)]
        input: PathBuf,

        /// Brand to write recommendations for; repeat to analyze several
        #[arg(long = "home-brand")]
        home_brands: Vec<String>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// End of the current trend window (defaults to the newest post)
        #[arg(long)]
        as_of: Option<DateTime<Utc>>,
    },
    /// Rank brands by average engagement only
    Rank {
        /// JSONL or JSON-array scrape dump (`-` reads stdin)
        #[arg(long, short)]
        input: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Validate and list the brand watch-list
    Brands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Markdown,
}

/// One home brand's analysis as emitted in JSON output.
#[derive(Debug, Serialize)]
struct HomeBrandAnalysis<'a> {
    home_brand: &'a str,
    #[serde(flatten)]
    result: &'a AnalysisResult,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = brandpulse_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(env = %config.env, "configuration loaded");

    let brands_path = cli
        .brands
        .clone()
        .unwrap_or_else(|| config.brands_path.clone());

    match cli.command {
        Commands::Analyze {
            input,
            home_brands,
            format,
            as_of,
        } => run_analyze(&config, &brands_path, &input, &home_brands, format, as_of),
        Commands::Rank { input, format } => run_rank(&brands_path, &input, format),
        Commands::Brands => run_brands(&brands_path),
    }
}

fn run_analyze(
    config: &AppConfig,
    brands_path: &Path,
    input: &Path,
    home_brands: &[String],
    format: OutputFormat,
    as_of: Option<DateTime<Utc>>,
) -> anyhow::Result<()> {
    let brands = load_watch_list(brands_path)?;
    let homes = resolve_home_brands(
        home_brands,
        config.home_brand.as_deref(),
        &brands,
        brands_path,
    )?;
    let records = input::read_records(input)?;

    let directory = BrandDirectory::from_brands(&brands);
    let configs: Vec<AnalysisConfig> = homes
        .iter()
        .map(|home| {
            let analysis = AnalysisConfig::from_app_config(config, home.as_str())
                .with_directory(directory.clone());
            match as_of {
                Some(as_of) => analysis.with_as_of(as_of),
                None => analysis,
            }
        })
        .collect();

    let results = analyze_all(&records, &configs)?;

    match format {
        OutputFormat::Json => {
            let reports: Vec<HomeBrandAnalysis<'_>> = homes
                .iter()
                .zip(&results)
                .map(|(home, result)| HomeBrandAnalysis {
                    home_brand: home,
                    result,
                })
                .collect();
            let json = match reports.as_slice() {
                [single] => serde_json::to_string_pretty(single)?,
                many => serde_json::to_string_pretty(many)?,
            };
            println!("{json}");
        }
        OutputFormat::Markdown => {
            for (i, (home, result)) in homes.iter().zip(&results).enumerate() {
                if i > 0 {
                    println!();
                    println!("---");
                    println!();
                }
                print!(
                    "{}",
                    AnalysisReport {
                        home_brand: home,
                        result,
                    }
                );
            }
        }
    }

    Ok(())
}

/// Analyze the same records once per config.
///
/// Several configs run concurrently on scoped threads; they share the decoded
/// records and nothing else.
fn analyze_all(
    records: &[RawRecord],
    configs: &[AnalysisConfig],
) -> anyhow::Result<Vec<AnalysisResult>> {
    if let [config] = configs {
        let result = analyze(records.iter().cloned(), config)
            .with_context(|| format!("analysis for home brand '{}' failed", config.home_brand))?;
        return Ok(vec![result]);
    }

    std::thread::scope(|scope| {
        let handles: Vec<_> = configs
            .iter()
            .map(|config| {
                let handle = scope.spawn(move || analyze(records.iter().cloned(), config));
                (config, handle)
            })
            .collect();

        handles
            .into_iter()
            .map(|(config, handle)| {
                let outcome = handle.join().map_err(|_| {
                    anyhow::anyhow!("analysis thread for '{}' panicked", config.home_brand)
                })?;
                outcome.with_context(|| {
                    format!("analysis for home brand '{}' failed", config.home_brand)
                })
            })
            .collect()
    })
}

fn run_rank(brands_path: &Path, input: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let brands = load_watch_list(brands_path)?;
    let records = input::read_records(input)?;
    let ranked = rank_with_directory(records, &BrandDirectory::from_brands(&brands));
    tracing::info!(brands = ranked.len(), "ranking complete");

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&ranked)?),
        OutputFormat::Markdown => {
            println!("# Brand Ranking");
            println!();
            print!("{}", RankingTable(&ranked));
        }
    }
    Ok(())
}

fn run_brands(brands_path: &Path) -> anyhow::Result<()> {
    let brands = load_brands(brands_path)
        .with_context(|| format!("invalid watch-list {}", brands_path.display()))?;

    if brands.brands.is_empty() {
        println!("no brands configured in {}", brands_path.display());
        return Ok(());
    }

    println!("{:<25}{:<14}HANDLES", "BRAND", "RELATIONSHIP");
    for brand in &brands.brands {
        println!(
            "{:<25}{:<14}{}",
            brand.name,
            brand.relationship.to_string(),
            brand.normalized_handles().join(", ")
        );
    }
    println!();
    println!(
        "{} brand(s), home: {}",
        brands.brands.len(),
        brands.home_brand().map_or("none", |b| b.name.as_str())
    );
    Ok(())
}

/// Load the watch-list, or an empty one when the file does not exist.
///
/// A file that exists but fails to parse or validate is an error.
fn load_watch_list(path: &Path) -> anyhow::Result<BrandsFile> {
    if !path.exists() {
        tracing::warn!(
            path = %path.display(),
            "brand watch-list not found; brands will not be canonicalised"
        );
        return Ok(BrandsFile::default());
    }
    load_brands(path).with_context(|| format!("invalid watch-list {}", path.display()))
}

/// Home brands for an analyze run, by precedence: `--home-brand` flags, the
/// configured override, then the watch-list's `home` brand.
fn resolve_home_brands(
    from_cli: &[String],
    configured: Option<&str>,
    brands: &BrandsFile,
    brands_path: &Path,
) -> anyhow::Result<Vec<String>> {
    let mut homes: Vec<String> = Vec::new();
    for name in from_cli
        .iter()
        .map(String::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
    {
        if !homes.iter().any(|h| h.to_lowercase() == name.to_lowercase()) {
            homes.push(name.to_string());
        }
    }
    if !homes.is_empty() {
        return Ok(homes);
    }

    if let Some(name) = configured.map(str::trim).filter(|n| !n.is_empty()) {
        return Ok(vec![name.to_string()]);
    }

    brands
        .home_brand()
        .map(|b| vec![b.name.clone()])
        .ok_or_else(|| {
            anyhow::anyhow!(
                "no home brand: pass --home-brand, set BRANDPULSE_HOME_BRAND, or mark a brand \
                 `relationship: home` in {}",
                brands_path.display()
            )
        })
}
