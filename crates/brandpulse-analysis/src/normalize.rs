//! Normalization of heterogeneous scrape records into [`Post`]s.
//!
//! Source kind is inferred structurally: an ordered list of pure matchers
//! is tried against the raw object and the first hit wins, with Instagram
//! as the fallback. Field extraction is lenient; anything that cannot even
//! be read as a JSON object is dropped and counted, never raised.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::attribute::{attribute, BrandDirectory};
use crate::error::SkipReason;
use crate::types::{Platform, Post, RawRecord};

type RawObject = Map<String, Value>;

const VIDEO_URL_KEYS: &[&str] = &["webVideoUrl", "videoUrlNoWaterMark", "videoMeta"];
const MUSIC_KEYS: &[&str] = &["musicMeta", "music"];
const SHORT_VIDEO_COUNTER_KEYS: &[&str] = &["diggCount", "playCount"];
const HASHTAG_MARKER_KEYS: &[&str] = &["hashtag", "searchHashtag", "inputHashtag"];
const TAG_EXPLORE_PATHS: &[&str] = &["/explore/tags/", "/tag/"];

const LIKE_KEYS: &[&str] = &["likesCount", "likes", "diggCount", "likeCount"];
const COMMENT_KEYS: &[&str] = &["commentsCount", "comments", "commentCount"];
const SHARE_KEYS: &[&str] = &["sharesCount", "shares", "shareCount"];
const VIEW_KEYS: &[&str] = &[
    "videoViewCount",
    "videoPlayCount",
    "playCount",
    "viewCount",
    "views",
];
const TIMESTAMP_KEYS: &[&str] = &[
    "timestamp",
    "createTimeISO",
    "takenAt",
    "created_at",
    "date",
    "createTime",
    "takenAtTimestamp",
];
const CAPTION_KEYS: &[&str] = &["caption", "text", "description"];
const URL_KEYS: &[&str] = &["url", "webVideoUrl", "postUrl"];
const OWNER_KEYS: &[&str] = &[
    "ownerUsername",
    "username",
    "authorMeta.name",
    "author.uniqueId",
    "owner.username",
];
const FOLLOWER_KEYS: &[&str] = &[
    "followersCount",
    "ownerFollowersCount",
    "authorMeta.fans",
    "owner.followersCount",
];
const HASHTAG_LIST_KEYS: &[&str] = &["hashtags", "challenges"];

/// Unix timestamps above this are taken to be in milliseconds.
const MILLIS_CUTOFF: i64 = 100_000_000_000;

static CAPTION_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([\p{L}\p{N}_]+)").expect("valid hashtag regex"));

/// A structural matcher: a pure predicate over the raw object.
type Matcher = fn(&RawObject) -> bool;

/// Matchers in priority order; shapes overlap, so order matters.
const PLATFORM_MATCHERS: &[(Platform, Matcher)] = &[
    (Platform::TikTok, is_short_video),
    (Platform::Hashtag, is_hashtag_post),
];

/// Skip tallies per [`SkipReason`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkipCounts {
    pub malformed: u64,
    pub not_an_object: u64,
    pub unrecognized: u64,
}

impl SkipCounts {
    #[must_use]
    pub fn total(&self) -> u64 {
        self.malformed + self.not_an_object + self.unrecognized
    }

    fn record(&mut self, reason: &SkipReason) {
        match reason {
            SkipReason::Malformed(_) => self.malformed += 1,
            SkipReason::NotAnObject => self.not_an_object += 1,
            SkipReason::Unrecognized => self.unrecognized += 1,
        }
    }
}

/// Lazy, single-pass stream of normalized posts.
///
/// Records that fail to normalize are dropped as the stream advances and
/// tallied in [`skipped`](Self::skipped). The counts are only final once the
/// stream is exhausted.
#[derive(Debug)]
pub struct PostStream<'d, I> {
    records: I,
    directory: &'d BrandDirectory,
    skipped: SkipCounts,
    index: u64,
}

impl<I> PostStream<'_, I> {
    #[must_use]
    pub fn skipped(&self) -> u64 {
        self.skipped.total()
    }

    #[must_use]
    pub fn skip_counts(&self) -> SkipCounts {
        self.skipped
    }
}

impl<I> Iterator for PostStream<'_, I>
where
    I: Iterator,
    I::Item: Into<RawRecord>,
{
    type Item = Post;

    fn next(&mut self) -> Option<Post> {
        loop {
            let raw = self.records.next()?.into();
            let index = self.index;
            self.index += 1;

            match normalize_record(raw, self.directory) {
                Ok(post) => return Some(post),
                Err(reason) => {
                    tracing::debug!(record = index, reason = %reason, "skipping raw record");
                    self.skipped.record(&reason);
                }
            }
        }
    }
}

/// Wrap raw records in a lazy [`PostStream`].
pub fn normalize_records<I>(records: I, directory: &BrandDirectory) -> PostStream<'_, I::IntoIter>
where
    I: IntoIterator,
    I::Item: Into<RawRecord>,
{
    PostStream {
        records: records.into_iter(),
        directory,
        skipped: SkipCounts::default(),
        index: 0,
    }
}

/// Normalize and attribute one raw record.
///
/// # Errors
///
/// Returns the [`SkipReason`] when the record is not valid JSON, is not an
/// object, or carries none of the fields a post is recognized by.
pub fn normalize_record(raw: RawRecord, directory: &BrandDirectory) -> Result<Post, SkipReason> {
    let value = match raw {
        RawRecord::Text(text) => serde_json::from_str::<Value>(&text)
            .map_err(|e| SkipReason::Malformed(e.to_string()))?,
        RawRecord::Json(value) => value,
    };

    let Value::Object(obj) = value else {
        return Err(SkipReason::NotAnObject);
    };

    if !has_shape_markers(&obj) {
        return Err(SkipReason::Unrecognized);
    }

    let draft = Post {
        platform: detect_platform(&obj),
        brand: String::new(),
        owner: string_field(&obj, OWNER_KEYS),
        timestamp: timestamp_field(&obj),
        likes: count_field(&obj, LIKE_KEYS),
        comments: count_field(&obj, COMMENT_KEYS),
        shares: count_field(&obj, SHARE_KEYS),
        views: count_field(&obj, VIEW_KEYS),
        caption: string_field(&obj, CAPTION_KEYS).unwrap_or_default(),
        hashtags: BTreeSet::new(),
        url: string_field(&obj, URL_KEYS).unwrap_or_default(),
        followers_estimate: optional_count_field(&obj, FOLLOWER_KEYS),
    };

    let hashtags = collect_hashtags(&obj, &draft.caption);
    let brand = attribute(&draft, directory);

    Ok(Post {
        brand,
        hashtags,
        ..draft
    })
}

/// Infer the source kind of a raw object.
#[must_use]
pub fn detect_platform(obj: &RawObject) -> Platform {
    PLATFORM_MATCHERS
        .iter()
        .find(|(_, matches)| matches(obj))
        .map_or(Platform::Instagram, |(platform, _)| *platform)
}

fn is_short_video(obj: &RawObject) -> bool {
    has_any(obj, VIDEO_URL_KEYS) || has_any(obj, MUSIC_KEYS) || has_any(obj, SHORT_VIDEO_COUNTER_KEYS)
}

fn is_hashtag_post(obj: &RawObject) -> bool {
    if has_any(obj, HASHTAG_MARKER_KEYS) {
        return true;
    }
    string_field(obj, URL_KEYS).is_some_and(|url| {
        let url = url.to_ascii_lowercase();
        TAG_EXPLORE_PATHS.iter().any(|path| url.contains(path))
    })
}

fn has_shape_markers(obj: &RawObject) -> bool {
    [
        URL_KEYS,
        OWNER_KEYS,
        CAPTION_KEYS,
        LIKE_KEYS,
        COMMENT_KEYS,
        SHARE_KEYS,
        VIEW_KEYS,
        HASHTAG_LIST_KEYS,
        HASHTAG_MARKER_KEYS,
        VIDEO_URL_KEYS,
    ]
    .iter()
    .any(|keys| has_any(obj, keys))
}

/// Resolve a possibly dotted key (`authorMeta.name`) against the object.
fn lookup<'a>(obj: &'a RawObject, key: &str) -> Option<&'a Value> {
    let mut segments = key.split('.');
    let mut current = obj.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current).filter(|v| !v.is_null())
}

fn has_any(obj: &RawObject, keys: &[&str]) -> bool {
    keys.iter().any(|key| lookup(obj, key).is_some())
}

fn string_field(obj: &RawObject, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| lookup(obj, key)?.as_str())
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn count_field(obj: &RawObject, keys: &[&str]) -> u64 {
    optional_count_field(obj, keys).unwrap_or(0)
}

fn optional_count_field(obj: &RawObject, keys: &[&str]) -> Option<u64> {
    keys.iter()
        .filter_map(|key| lookup(obj, key))
        .find_map(as_count)
}

/// Read a non-negative count from a number or a digit string (`"1,204"`).
fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| {
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    let count = f.trunc() as u64;
                    count
                })
        }),
        Value::String(s) => s.trim().replace(',', "").parse::<u64>().ok(),
        _ => None,
    }
}

fn timestamp_field(obj: &RawObject) -> Option<DateTime<Utc>> {
    TIMESTAMP_KEYS
        .iter()
        .filter_map(|key| lookup(obj, key))
        .find_map(|value| match value {
            Value::String(s) => parse_timestamp(s),
            Value::Number(n) => n.as_i64().and_then(from_unix),
            _ => None,
        })
}

/// Parse an ISO-like timestamp.
///
/// Accepts RFC 3339, naive ISO date-times (taken as UTC), bare dates and
/// unix seconds or milliseconds written as digits. Returns `None` otherwise.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    if s.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse::<i64>().ok().and_then(from_unix);
    }

    None
}

fn from_unix(raw: i64) -> Option<DateTime<Utc>> {
    if raw <= 0 {
        return None;
    }
    if raw > MILLIS_CUTOFF {
        DateTime::from_timestamp_millis(raw)
    } else {
        DateTime::from_timestamp(raw, 0)
    }
}

/// Union of the searched tag of a hashtag-search record, an explicit
/// hashtag list and `#tags` found in the caption.
fn collect_hashtags(obj: &RawObject, caption: &str) -> BTreeSet<String> {
    let mut tags = BTreeSet::new();

    for key in HASHTAG_MARKER_KEYS {
        if let Some(tag) = lookup(obj, key)
            .and_then(Value::as_str)
            .map(normalize_tag)
            .filter(|t| !t.is_empty())
        {
            tags.insert(tag);
        }
    }

    for key in HASHTAG_LIST_KEYS {
        let Some(Value::Array(items)) = lookup(obj, key) else {
            continue;
        };
        for item in items {
            let name = match item {
                Value::String(s) => Some(s.as_str()),
                Value::Object(o) => o.get("name").or_else(|| o.get("title")).and_then(Value::as_str),
                _ => None,
            };
            if let Some(tag) = name.map(normalize_tag).filter(|t| !t.is_empty()) {
                tags.insert(tag);
            }
        }
    }

    for capture in CAPTION_TAG_RE.captures_iter(caption) {
        let tag = normalize_tag(&capture[1]);
        if !tag.is_empty() {
            tags.insert(tag);
        }
    }

    tags
}

fn normalize_tag(raw: &str) -> String {
    raw.trim().trim_start_matches('#').trim().to_lowercase()
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
