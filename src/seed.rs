//! Seed lists of parent entities
//!
//! Seeds are a JSON array of [`ParentEntity`]. The HTML source produces them
//! with `discover`; API seeds are prepared externally.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use url::Url;

use crate::error::{Error, Result};
use crate::models::ParentEntity;
use crate::parser::ListingEntry;
use crate::utils::sanitize_filename;

/// Load a seed file
///
/// # Errors
///
/// Returns `Error::Seed` if the file cannot be read or is not a JSON array
/// of entities, or contains an entity without a locator
pub fn load_seeds(path: &Path) -> Result<Vec<ParentEntity>> {
    let file = File::open(path).map_err(|e| Error::seed(path, e.to_string()))?;
    let entities: Vec<ParentEntity> = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| Error::seed(path, e.to_string()))?;

    if let Some(pos) = entities.iter().position(|e| e.locator.trim().is_empty()) {
        return Err(Error::seed(path, format!("entity at index {pos} has an empty locator")));
    }

    tracing::info!(path = %path.display(), entities = entities.len(), "Loaded seeds");
    Ok(entities)
}

/// Write a seed file, creating parent directories as needed
///
/// # Errors
///
/// Returns `Error::Io` or `Error::Json` on write failure
pub fn save_seeds(path: &Path, entities: &[ParentEntity]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, entities)?;
    writer.flush()?;
    Ok(())
}

/// Sort ascending by expected volume; ties keep their input order
pub fn order_by_rank(entities: &mut [ParentEntity]) {
    entities.sort_by_key(|e| e.ordering_rank);
}

/// Turn listing entries into seeds keyed by their URL path
pub fn from_listing(entries: &[ListingEntry]) -> Vec<ParentEntity> {
    entries
        .iter()
        .map(|entry| {
            ParentEntity::new(
                entity_id(&entry.url),
                entry.name.clone(),
                entry.url.clone(),
                entry.review_count,
            )
        })
        .collect()
}

/// Last non-empty path segment of a URL, falling back to the sanitized URL
fn entity_id(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).last().map(str::to_string))
        })
        .unwrap_or_else(|| sanitize_filename(url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_order_by_rank_is_stable() {
        let mut entities = vec![
            ParentEntity::new("a", "A", "a", 50),
            ParentEntity::new("b", "B", "b", 10),
            ParentEntity::new("c", "C", "c", 50),
            ParentEntity::new("d", "D", "d", 5),
        ];
        order_by_rank(&mut entities);
        let ids: Vec<_> = entities.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "b", "a", "c"]);
    }

    #[test]
    fn test_from_listing() {
        let entries = vec![ListingEntry {
            name: "Big Auto".into(),
            url: "https://reviews.example.com/dealer/big-auto/".into(),
            review_count: 1204,
        }];
        let seeds = from_listing(&entries);
        assert_eq!(seeds[0].id, "big-auto");
        assert_eq!(seeds[0].display_name, "Big Auto");
        assert_eq!(seeds[0].ordering_rank, 1204);
        assert_eq!(seeds[0].locator, "https://reviews.example.com/dealer/big-auto/");
    }

    #[test]
    fn test_save_and_load_seeds() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/seeds.json");
        let seeds = vec![ParentEntity::new("13", "Catan", "13", 100)];

        save_seeds(&path, &seeds).unwrap();
        assert_eq!(load_seeds(&path).unwrap(), seeds);
    }

    #[test]
    fn test_rank_defaults_to_zero() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seeds.json");
        fs::write(&path, r#"[{"id": "13", "display_name": "Catan", "locator": "13"}]"#).unwrap();
        assert_eq!(load_seeds(&path).unwrap()[0].ordering_rank, 0);
    }

    #[test]
    fn test_bad_seed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seeds.json");
        fs::write(&path, r#"{"id": "13"}"#).unwrap();
        assert!(matches!(load_seeds(&path), Err(Error::Seed { .. })));

        assert!(matches!(
            load_seeds(&dir.path().join("missing.json")),
            Err(Error::Seed { .. })
        ));

        fs::write(&path, r#"[{"id": "13", "display_name": "Catan", "locator": " "}]"#).unwrap();
        assert!(matches!(load_seeds(&path), Err(Error::Seed { .. })));
    }
}
