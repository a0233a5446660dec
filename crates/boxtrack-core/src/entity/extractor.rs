//! Extraction boundary between save containers and the scan pipeline.
//!
//! Parsing binary save formats is the job of an external reader. The pipeline
//! only depends on the [`EntityExtractor`] trait; [`JsonDumpExtractor`] reads
//! the record dumps such a reader produces.

use crate::config::{PathsConfig, ScanConfig, StoreConfig};
use crate::entity::EntityRecord;
use crate::error::{BoxtrackError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Produces the entity records stored in one container.
pub trait EntityExtractor {
    /// Extract every non-empty entity from `container`.
    ///
    /// A container that cannot be parsed returns an error; the caller skips it.
    fn extract(&self, container: &Path) -> Result<Vec<EntityRecord>>;
}

impl<F> EntityExtractor for F
where
    F: Fn(&Path) -> Result<Vec<EntityRecord>>,
{
    fn extract(&self, container: &Path) -> Result<Vec<EntityRecord>> {
        self(container)
    }
}

/// Reads JSON record dumps.
///
/// Accepts either a bare array of records or an object with an `entities`
/// array. Records without a container name are stamped with the dump's file
/// name, and empty slots are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDumpExtractor;

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordDump {
    Bare(Vec<EntityRecord>),
    Wrapped { entities: Vec<EntityRecord> },
}

impl EntityExtractor for JsonDumpExtractor {
    fn extract(&self, container: &Path) -> Result<Vec<EntityRecord>> {
        let contents = std::fs::read_to_string(container)
            .map_err(|e| BoxtrackError::io_with_path(e, container))?;

        let dump: RecordDump = serde_json::from_str(&contents)
            .map_err(|e| BoxtrackError::extraction(container, format!("unrecognized dump: {}", e)))?;

        let records = match dump {
            RecordDump::Bare(records) => records,
            RecordDump::Wrapped { entities } => entities,
        };

        let file_name = container_name(container);
        Ok(records
            .into_iter()
            .filter(|r| !r.is_empty_slot())
            .map(|mut r| {
                if r.container.is_empty() {
                    r.container = file_name.clone();
                }
                r
            })
            .collect())
    }
}

/// A container that was skipped during extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Result of extracting a batch of containers.
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    /// Records from every container that parsed, in container order.
    pub records: Vec<EntityRecord>,
    /// Containers that were skipped.
    pub failures: Vec<ContainerFailure>,
}

/// Extract records from each container in turn.
///
/// A failing container is logged and skipped; it never aborts the batch.
pub fn extract_all<E, P>(extractor: &E, containers: &[P]) -> ExtractionReport
where
    E: EntityExtractor + ?Sized,
    P: AsRef<Path>,
{
    let mut report = ExtractionReport::default();

    for container in containers {
        let container = container.as_ref();
        match extractor.extract(container) {
            Ok(records) => {
                debug!(
                    "Extracted {} entities from {}",
                    records.len(),
                    container.display()
                );
                report.records.extend(records);
            }
            Err(e) => {
                warn!("Skipping container {}: {}", container.display(), e);
                report.failures.push(ContainerFailure {
                    path: container.to_path_buf(),
                    message: e.to_string(),
                });
            }
        }
    }

    info!(
        "Extraction complete: {} entities, {} containers skipped",
        report.records.len(),
        report.failures.len()
    );
    report
}

/// Whether `path` looks like a binary save container (`*.pk*`).
pub fn is_save_container(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            e.to_ascii_lowercase()
                .starts_with(ScanConfig::CONTAINER_EXTENSION_PREFIX)
        })
        .unwrap_or(false)
}

/// Whether `path` is a JSON record dump readable by [`JsonDumpExtractor`].
pub fn is_record_dump(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(ScanConfig::DUMP_EXTENSION))
        .unwrap_or(false)
}

/// Recursively list the containers under `root` accepted by `accept`.
///
/// Hidden entries (including the metadata file) and the entity storage
/// directory are never visited. Results are sorted.
pub fn discover_containers<F>(root: &Path, accept: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&Path) -> bool,
{
    if !root.is_dir() {
        return Err(BoxtrackError::NotADirectory(root.to_path_buf()));
    }

    let mut containers: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_ignored(e))
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), err);
                None
            }
        })
        .filter(|e| e.file_type().is_file() && accept(e.path()))
        .map(|e| e.into_path())
        .collect();

    containers.sort();
    debug!("Discovered {} containers under {}", containers.len(), root.display());
    Ok(containers)
}

fn is_ignored(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.')
        || name == StoreConfig::METADATA_FILE_NAME
        || (entry.file_type().is_dir() && name == PathsConfig::ENTITY_STORAGE_DIR_NAME)
}

fn container_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Position;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_json_dump_bare_and_wrapped() {
        let temp = TempDir::new().unwrap();
        let bare = write(
            temp.path(),
            "a.json",
            r#"[{ "species": 25, "position": { "bucket": { "kind": "roster" }, "slot": 0 } }]"#,
        );
        let wrapped = write(
            temp.path(),
            "b.json",
            r#"{ "entities": [
                { "species": 4, "position": { "bucket": { "kind": "box", "index": 0 }, "slot": 1 } },
                { "species": 0, "position": { "bucket": { "kind": "box", "index": 0 }, "slot": 2 } }
            ] }"#,
        );

        let records = JsonDumpExtractor.extract(&bare).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].container, "a.json");

        let records = JsonDumpExtractor.extract(&wrapped).unwrap();
        assert_eq!(records.len(), 1, "empty slot must be dropped");
        assert_eq!(records[0].position, Position::boxed(0, 1));
    }

    #[test]
    fn test_extract_all_skips_failing_containers() {
        let temp = TempDir::new().unwrap();
        let good = write(
            temp.path(),
            "good.json",
            r#"[{ "species": 7, "position": { "bucket": { "kind": "roster" }, "slot": 0 } }]"#,
        );
        let bad = write(temp.path(), "bad.json", "not json at all");
        let missing = temp.path().join("missing.json");
        let also_good = write(
            temp.path(),
            "also_good.json",
            r#"[{ "species": 8, "position": { "bucket": { "kind": "roster" }, "slot": 0 } }]"#,
        );

        let report = extract_all(&JsonDumpExtractor, &[good, bad.clone(), missing, also_good]);
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].path, bad);
    }

    #[test]
    fn test_closure_extractor() {
        let extractor = |path: &Path| -> Result<Vec<EntityRecord>> {
            if path.ends_with("broken.pk8") {
                Err(BoxtrackError::extraction(path, "bad checksum"))
            } else {
                Ok(vec![EntityRecord::new(1, Position::roster(0))])
            }
        };
        let report = extract_all(&extractor, &["one.pk8", "broken.pk8", "two.pk8"]);
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.failures.len(), 1);
    }

    #[test]
    fn test_discover_containers() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "b.pk8", "");
        write(temp.path(), "nested/a.PK3", "");
        write(temp.path(), "notes.txt", "");
        write(temp.path(), ".boxtrack.meta.json", "{}");
        write(temp.path(), "entities/0025-1/x.pk8", "");
        write(temp.path(), "dump.json", "[]");

        let found = discover_containers(temp.path(), is_save_container).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(temp.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(names, vec![PathBuf::from("b.pk8"), PathBuf::from("nested/a.PK3")]);

        let dumps = discover_containers(temp.path(), is_record_dump).unwrap();
        assert_eq!(dumps, vec![temp.path().join("dump.json")]);
    }

    #[test]
    fn test_discover_rejects_file_root() {
        let temp = TempDir::new().unwrap();
        let file = write(temp.path(), "x.pk8", "");
        assert!(matches!(
            discover_containers(&file, is_save_container),
            Err(BoxtrackError::NotADirectory(_))
        ));
    }
}
