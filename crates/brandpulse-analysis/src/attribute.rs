//! Brand attribution from owner fields and post URLs.

use std::collections::HashMap;

use brandpulse_core::{normalize_handle, BrandsFile};

use crate::types::Post;

/// Bucket for posts whose owner cannot be inferred.
pub const UNKNOWN_BRAND: &str = "Unknown";

/// First path segments on instagram.com that never name an account.
const RESERVED_INSTAGRAM_SEGMENTS: &[&str] = &[
    "p", "reel", "reels", "tv", "explore", "stories", "accounts", "direct",
];

/// Maps known account handles and brand names to a canonical display name.
///
/// Built from the brand watch-list. Lookup is case-insensitive and ignores a
/// leading `@`. Identities not in the directory are left untouched: the
/// directory canonicalises, it never filters.
#[derive(Debug, Clone, Default)]
pub struct BrandDirectory {
    aliases: HashMap<String, String>,
}

impl BrandDirectory {
    #[must_use]
    pub fn from_brands(brands: &BrandsFile) -> Self {
        let mut aliases = HashMap::new();
        for brand in &brands.brands {
            aliases.insert(normalize_handle(&brand.name), brand.name.clone());
            aliases.insert(brand.slug(), brand.name.clone());
            for handle in brand.normalized_handles() {
                aliases.insert(handle, brand.name.clone());
            }
        }
        Self { aliases }
    }

    /// Canonical brand name for `identity`, if the directory knows it.
    #[must_use]
    pub fn resolve(&self, identity: &str) -> Option<&str> {
        self.aliases
            .get(&normalize_handle(identity))
            .map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// Attribute a post to a brand identity.
///
/// Prefers the explicit owner field, then the account segment of the post
/// URL, and falls back to [`UNKNOWN_BRAND`]. Same input, same output.
#[must_use]
pub fn attribute(post: &Post, directory: &BrandDirectory) -> String {
    let identity = post
        .owner
        .as_deref()
        .map(clean_identity)
        .filter(|owner| !owner.is_empty())
        .or_else(|| handle_from_url(&post.url));

    match identity {
        Some(identity) => directory
            .resolve(&identity)
            .map_or(identity, str::to_string),
        None => UNKNOWN_BRAND.to_string(),
    }
}

/// Extract the account handle from an Instagram or TikTok URL.
///
/// `https://www.instagram.com/acme/` yields `acme`; post permalinks such as
/// `instagram.com/p/<code>` carry no account and yield `None`.
/// `https://www.tiktok.com/@acme/video/123` yields `acme`.
#[must_use]
pub fn handle_from_url(url: &str) -> Option<String> {
    let trimmed = url.trim();
    let without_scheme = trimmed
        .split_once("://")
        .map_or(trimmed, |(_, rest)| rest);
    let without_query = without_scheme
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    let mut parts = without_query.split('/');
    let host = parts.next()?.to_ascii_lowercase();
    let first_segment = parts.find(|segment| !segment.is_empty())?;

    if host == "instagram.com" || host.ends_with(".instagram.com") {
        let lowered = first_segment.to_ascii_lowercase();
        if RESERVED_INSTAGRAM_SEGMENTS.contains(&lowered.as_str()) {
            return None;
        }
        return Some(clean_identity(first_segment)).filter(|h| !h.is_empty());
    }

    if host == "tiktok.com" || host.ends_with(".tiktok.com") {
        return first_segment
            .strip_prefix('@')
            .map(clean_identity)
            .filter(|h| !h.is_empty());
    }

    None
}

fn clean_identity(raw: &str) -> String {
    raw.trim().trim_start_matches('@').trim().to_string()
}
