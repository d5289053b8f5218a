use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relationship {
    /// The brand recommendations are generated for.
    Home,
    Competitor,
}

impl std::fmt::Display for Relationship {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Relationship::Home => write!(f, "home"),
            Relationship::Competitor => write!(f, "competitor"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandConfig {
    pub name: String,
    pub relationship: Relationship,
    /// Social account handles (Instagram username, TikTok unique id) that
    /// should be attributed to this brand.
    #[serde(default)]
    pub handles: Vec<String>,
    pub notes: Option<String>,
}

impl BrandConfig {
    /// Generate a URL-safe slug from the brand name.
    #[must_use]
    pub fn slug(&self) -> String {
        self.name
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' {
                    c
                } else if c == ' ' {
                    '-'
                } else {
                    '\0'
                }
            })
            .filter(|&c| c != '\0')
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }

    /// Handles normalized for lookup: trimmed, `@` stripped, lowercased.
    #[must_use]
    pub fn normalized_handles(&self) -> Vec<String> {
        self.handles
            .iter()
            .map(|h| normalize_handle(h))
            .filter(|h| !h.is_empty())
            .collect()
    }
}

/// Canonical lookup form of an account handle.
#[must_use]
pub fn normalize_handle(handle: &str) -> String {
    handle.trim().trim_start_matches('@').trim().to_lowercase()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrandsFile {
    pub brands: Vec<BrandConfig>,
}

impl BrandsFile {
    /// The single brand marked `relationship: home`, if any.
    #[must_use]
    pub fn home_brand(&self) -> Option<&BrandConfig> {
        self.brands
            .iter()
            .find(|b| b.relationship == Relationship::Home)
    }
}

/// Load and validate the brand watch-list from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_brands(path: &Path) -> Result<BrandsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::BrandsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_brands(&content)
}

/// Parse and validate a brand watch-list from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_brands(content: &str) -> Result<BrandsFile, ConfigError> {
    let brands_file: BrandsFile = serde_yaml::from_str(content)?;
    validate_brands(&brands_file)?;
    Ok(brands_file)
}

fn validate_brands(brands_file: &BrandsFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();
    let mut seen_slugs = HashSet::new();
    let mut seen_handles = HashSet::new();
    let mut home: Option<&str> = None;

    for brand in &brands_file.brands {
        if brand.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "brand name must be non-empty".to_string(),
            ));
        }

        let lower_name = brand.name.to_lowercase();
        if !seen_names.insert(lower_name) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand name: '{}'",
                brand.name
            )));
        }

        let slug = brand.slug();
        if !seen_slugs.insert(slug.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand slug: '{}' (from brand '{}')",
                slug, brand.name
            )));
        }

        if brand.relationship == Relationship::Home {
            if let Some(existing) = home {
                return Err(ConfigError::Validation(format!(
                    "multiple home brands: '{existing}' and '{}'",
                    brand.name
                )));
            }
            home = Some(&brand.name);
        }

        for raw in &brand.handles {
            let handle = normalize_handle(raw);
            if handle.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "brand '{}' has an empty handle",
                    brand.name
                )));
            }
            if !seen_handles.insert(handle.clone()) {
                return Err(ConfigError::Validation(format!(
                    "handle '{handle}' is listed under more than one brand (last: '{}')",
                    brand.name
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "brands_test.rs"]
mod tests;
