//! Dataset ingestion: one CSV in, a vector of seeds out.
//!
//! The dataset is machine-merged from two rating sources, so fields arrive
//! in whatever shape the merge left them. Parsing is lenient per field: a
//! value that does not parse becomes `None`, never an error. Only a row
//! without a title is dropped.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{info, warn};

use super::model::MovieSeed;

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    year: Option<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    imdb_id: Option<String>,
    #[serde(default)]
    imdb_url: Option<String>,
    #[serde(default)]
    douban_id: Option<String>,
    #[serde(default)]
    douban_url: Option<String>,
    #[serde(default)]
    imdb_rating: Option<String>,
    #[serde(default)]
    imdb_votes: Option<String>,
    #[serde(default)]
    douban_rating: Option<String>,
    #[serde(default)]
    douban_votes: Option<String>,
}

/// Load every usable row from the dataset CSV.
///
/// # Errors
/// Returns an error when the file cannot be opened or is not CSV at all;
/// individual malformed rows are skipped with a warning.
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<MovieSeed>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("failed to open dataset {}", path.display()))?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut seeds = Vec::new();
    let mut skipped = 0_usize;

    for (index, row) in reader.deserialize::<RawRow>().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(error) => {
                warn!(row = index + 1, %error, "skipping unreadable dataset row");
                skipped += 1;
                continue;
            }
        };

        let Some(title) = opt_text(row.title) else {
            skipped += 1;
            continue;
        };

        seeds.push(MovieSeed {
            title,
            year: row.year.as_deref().and_then(parse_year),
            region: opt_text(row.region),
            imdb_id: opt_text(row.imdb_id),
            imdb_url: opt_text(row.imdb_url),
            douban_id: row.douban_id.as_deref().and_then(parse_count),
            douban_url: opt_text(row.douban_url),
            imdb_rating: row.imdb_rating.as_deref().and_then(parse_rating),
            imdb_votes: row.imdb_votes.as_deref().and_then(parse_count),
            douban_rating: row.douban_rating.as_deref().and_then(parse_rating),
            douban_votes: row.douban_votes.as_deref().and_then(parse_count),
        });
    }

    info!(
        dataset = %path.display(),
        loaded = seeds.len(),
        skipped,
        "dataset loaded"
    );

    Ok(seeds)
}

fn opt_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Accept plain integers plus messy variants like `1994.0` or `1994–1995`
/// (first four-digit run wins).
fn parse_year(raw: &str) -> Option<i32> {
    static FOUR_DIGITS: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\d{4}").expect("year pattern compiles"));

    let trimmed = raw.trim();
    if let Ok(year) = trimmed.parse::<i32>() {
        return Some(year);
    }

    FOUR_DIGITS
        .find(trimmed)
        .and_then(|m| m.as_str().parse::<i32>().ok())
}

/// Ratings live on a 0–10 scale; anything else is noise.
fn parse_rating(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| (0.0..=10.0).contains(value))
}

/// Vote counts and numeric ids; tolerates thousands separators and float
/// renderings, rejects negatives.
fn parse_count(raw: &str) -> Option<i64> {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }

    let parsed = cleaned
        .parse::<i64>()
        .ok()
        .or_else(|| cleaned.parse::<f64>().ok().map(|value| value.trunc() as i64))?;

    (parsed >= 0).then_some(parsed)
}
