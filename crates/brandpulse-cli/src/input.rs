//! Reading scrape dumps from disk or stdin.

use std::io::Read;
use std::path::Path;

use anyhow::Context;
use brandpulse_analysis::RawRecord;
use serde_json::Value;

/// Read a dump file, or stdin when `path` is `-`.
///
/// # Errors
///
/// Returns an error if the source cannot be read or a JSON array dump is not
/// valid JSON.
pub(crate) fn read_records(path: &Path) -> anyhow::Result<Vec<RawRecord>> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read records from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?
    };

    let records = parse_records(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    tracing::debug!(path = %path.display(), records = records.len(), "loaded raw records");
    Ok(records)
}

/// Split a dump into raw records.
///
/// A document starting with `[` is one JSON array whose elements are the
/// records. Anything else is JSONL: one record per non-blank line, left
/// undecoded so a bad line is skipped by the pipeline instead of failing the
/// whole file.
///
/// The two formats fail differently. A JSON array is decoded as a single
/// document, so one syntax error anywhere in it is an error for the whole
/// file and no records are returned. In JSONL the same error only drops its
/// own line, which the pipeline then reports in `skipped_record_count`.
/// Array elements that decode but are not objects are still skipped and
/// counted per record.
pub(crate) fn parse_records(content: &str) -> anyhow::Result<Vec<RawRecord>> {
    if content.trim_start().starts_with('[') {
        let items: Vec<Value> = serde_json::from_str(content)
            .context("input looks like a JSON array but is not valid JSON")?;
        return Ok(items.into_iter().map(RawRecord::Json).collect());
    }

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(RawRecord::from)
        .collect())
}
