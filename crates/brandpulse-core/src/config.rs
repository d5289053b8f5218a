use crate::app_config::{AppConfig, Environment, ViralThresholds};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let env = parse_environment(&or_default("BRANDPULSE_ENV", "development"))?;
    let log_level = or_default("BRANDPULSE_LOG_LEVEL", "info");
    let brands_path = PathBuf::from(or_default(
        "BRANDPULSE_BRANDS_PATH",
        "./config/brands.yaml",
    ));
    let home_brand = lookup("BRANDPULSE_HOME_BRAND")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let trend_window_days: i64 = parse_as(
        "BRANDPULSE_TREND_WINDOW_DAYS",
        &or_default("BRANDPULSE_TREND_WINDOW_DAYS", "7"),
    )?;

    let defaults = ViralThresholds::default();
    let viral_thresholds = ViralThresholds {
        instagram: parse_as(
            "BRANDPULSE_VIRAL_THRESHOLD_INSTAGRAM",
            &or_default(
                "BRANDPULSE_VIRAL_THRESHOLD_INSTAGRAM",
                &defaults.instagram.to_string(),
            ),
        )?,
        hashtag: parse_as(
            "BRANDPULSE_VIRAL_THRESHOLD_HASHTAG",
            &or_default(
                "BRANDPULSE_VIRAL_THRESHOLD_HASHTAG",
                &defaults.hashtag.to_string(),
            ),
        )?,
        tiktok: parse_as(
            "BRANDPULSE_VIRAL_THRESHOLD_TIKTOK",
            &or_default(
                "BRANDPULSE_VIRAL_THRESHOLD_TIKTOK",
                &defaults.tiktok.to_string(),
            ),
        )?,
    };

    let min_posts_per_window: u64 = parse_as(
        "BRANDPULSE_MIN_POSTS_PER_WINDOW",
        &or_default("BRANDPULSE_MIN_POSTS_PER_WINDOW", "5"),
    )?;
    let max_cultural_moments: usize = parse_as(
        "BRANDPULSE_MAX_CULTURAL_MOMENTS",
        &or_default("BRANDPULSE_MAX_CULTURAL_MOMENTS", "10"),
    )?;
    let engagement_gap_fraction: f64 = parse_as(
        "BRANDPULSE_ENGAGEMENT_GAP_FRACTION",
        &or_default("BRANDPULSE_ENGAGEMENT_GAP_FRACTION", "0.5"),
    )?;
    let critical_gap_multiple: f64 = parse_as(
        "BRANDPULSE_CRITICAL_GAP_MULTIPLE",
        &or_default("BRANDPULSE_CRITICAL_GAP_MULTIPLE", "3.0"),
    )?;
    let trend_velocity_threshold: f64 = parse_as(
        "BRANDPULSE_TREND_VELOCITY_THRESHOLD",
        &or_default("BRANDPULSE_TREND_VELOCITY_THRESHOLD", "50.0"),
    )?;

    Ok(AppConfig {
        env,
        log_level,
        brands_path,
        home_brand,
        trend_window_days,
        viral_thresholds,
        min_posts_per_window,
        max_cultural_moments,
        engagement_gap_fraction,
        critical_gap_multiple,
        trend_velocity_threshold,
    })
}

fn parse_as<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test` or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "BRANDPULSE_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
