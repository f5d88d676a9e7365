//! Durable output file for a harvest run
//!
//! The whole buffer is rewritten on every flush: serialize to a temp file in
//! the same directory, then rename over the target. A crash mid-write leaves
//! the previous checkpoint intact.
//!
//! ```json
//! [
//!   {"game_name": "CATAN", "reviews": [{"rating": 7.0, "review_text": "..."}]}
//! ]
//! ```

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::models::{AcceptedRecord, ParentResult, SourceKind};

/// One parent result keyed by the source's name field
struct KeyedResult<'a> {
    name_field: &'static str,
    result: &'a ParentResult,
}

impl Serialize for KeyedResult<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(self.name_field, &self.result.parent_name)?;
        map.serialize_entry("reviews", &self.result.records)?;
        map.end()
    }
}

struct KeyedResults<'a> {
    name_field: &'static str,
    results: &'a [ParentResult],
}

impl Serialize for KeyedResults<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.results.len()))?;
        for result in self.results {
            seq.serialize_element(&KeyedResult {
                name_field: self.name_field,
                result,
            })?;
        }
        seq.end()
    }
}

#[derive(Deserialize)]
struct StoredResult {
    #[serde(rename = "business_name", alias = "game_name")]
    name: String,
    #[serde(default)]
    reviews: Vec<AcceptedRecord>,
}

/// Checkpoint file for one source and run date
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
    prefix: String,
    kind: SourceKind,
    date: NaiveDate,
}

impl CheckpointStore {
    /// Store dated today (local time)
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>, kind: SourceKind) -> Self {
        Self::with_date(dir, prefix, kind, Local::now().date_naive())
    }

    pub fn with_date(
        dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
        kind: SourceKind,
        date: NaiveDate,
    ) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            kind,
            date,
        }
    }

    /// Store using the configured output directory and per-source prefix
    pub fn from_config(config: &Config, kind: SourceKind) -> Self {
        let prefix = match kind {
            SourceKind::Html => &config.output.html_prefix,
            SourceKind::Api => &config.output.api_prefix,
        };
        Self::new(config.output.dir.clone(), prefix.clone(), kind)
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// `{dir}/{prefix}_{YYYY-MM-DD}.json`
    pub fn path(&self) -> PathBuf {
        self.dir
            .join(format!("{}_{}.json", self.prefix, self.date.format("%Y-%m-%d")))
    }

    /// Atomically replace the checkpoint file with `results`
    pub fn save(&self, results: &[ParentResult]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).with_context(|| {
            format!("Failed to create output directory: {}", self.dir.display())
        })?;

        let path = self.path();
        let temp_path = path.with_extension("json.tmp");

        let file = File::create(&temp_path)
            .with_context(|| format!("Failed to create checkpoint file: {}", temp_path.display()))?;

        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(
            &mut writer,
            &KeyedResults {
                name_field: self.kind.name_field(),
                results,
            },
        )
        .context("Failed to serialize checkpoint")?;
        writer.flush().context("Failed to flush checkpoint")?;
        drop(writer);

        fs::rename(&temp_path, &path)
            .with_context(|| format!("Failed to rename checkpoint file: {}", path.display()))?;

        tracing::debug!(path = %path.display(), parents = results.len(), "Checkpoint saved");
        Ok(path)
    }

    /// Load this store's checkpoint, if present
    pub fn load(&self) -> Result<Option<Vec<ParentResult>>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        load_results(&path).map(Some)
    }
}

/// Read any checkpoint file, accepting either name field
pub fn load_results(path: &Path) -> Result<Vec<ParentResult>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open checkpoint file: {}", path.display()))?;

    let stored: Vec<StoredResult> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to deserialize checkpoint: {}", path.display()))?;

    tracing::debug!(path = %path.display(), parents = stored.len(), "Checkpoint loaded");

    Ok(stored
        .into_iter()
        .map(|s| ParentResult {
            parent_name: s.name,
            records: s.reviews,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rating;
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    fn sample() -> Vec<ParentResult> {
        vec![ParentResult {
            parent_name: "CATAN".to_string(),
            records: vec![
                AcceptedRecord {
                    rating: Rating::Numeric(7.0),
                    title: None,
                    body: Some("Classic".to_string()),
                },
                AcceptedRecord {
                    rating: Rating::Categorical("Recommended".to_string()),
                    title: Some("Great service".to_string()),
                    body: None,
                },
            ],
        }]
    }

    #[test]
    fn test_path_encodes_date() {
        let store = CheckpointStore::with_date("/tmp/out", "bgg_reviews", SourceKind::Api, date());
        assert_eq!(store.path(), PathBuf::from("/tmp/out/bgg_reviews_2024-03-09.json"));
    }

    #[test]
    fn test_save_uses_source_name_field() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::with_date(dir.path(), "bgg", SourceKind::Api, date());
        let path = store.save(&sample()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let first = &value[0];
        assert_eq!(first["game_name"], "CATAN");
        assert!(first.get("business_name").is_none());
        assert_eq!(first["reviews"][0]["rating"], 7.0);
        assert_eq!(first["reviews"][0]["review_text"], "Classic");
        assert!(first["reviews"][0].get("review_title").is_none());
        assert_eq!(first["reviews"][1]["rating"], "Recommended");
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::with_date(dir.path(), "biz", SourceKind::Html, date());
        assert!(store.load().unwrap().is_none());

        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap().unwrap(), sample());
    }

    #[test]
    fn test_save_overwrites_whole_file() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::with_date(dir.path(), "biz", SourceKind::Html, date());
        store.save(&sample()).unwrap();
        store.save(&[]).unwrap();
        assert!(store.load().unwrap().unwrap().is_empty());
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();
        assert!(load_results(&path).is_err());
    }
}
