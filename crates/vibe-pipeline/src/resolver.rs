//! External camera identifier resolution.
//!
//! Resolution order:
//! - explicit `nyc_uuid` on the camera
//! - the first UUID-shaped provider handle
//! - reverse lookup in the preloaded [`CameraDirectory`]
//!
//! Nothing here does network I/O, and there is no default id: a camera that
//! matches none of the above fails with `IdentifierNotFound`.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use vibe_models::CameraRecord;

use crate::error::{PipelineError, RunResult};
use crate::ports::IdentifierResolver;

/// One row of the zone lookup table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DirectoryEntry {
    #[serde(default)]
    pub zone_id: Option<String>,
    #[serde(default)]
    pub camera_handle: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub camera_name: Option<String>,
    #[serde(default)]
    pub borough: Option<String>,
    #[serde(default, alias = "camera_uuid")]
    pub nyc_uuid: Option<String>,
}

impl DirectoryEntry {
    fn matches_handle(&self, needle: &str) -> bool {
        [&self.camera_handle, &self.handle]
            .into_iter()
            .flatten()
            .any(|h| h == needle)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DirectoryFile {
    Keyed(BTreeMap<String, DirectoryEntry>),
    List(Vec<DirectoryEntry>),
}

/// Preloaded camera directory.
///
/// Entries keep their load order; a keyed file is loaded in key order.
#[derive(Debug, Clone, Default)]
pub struct CameraDirectory {
    entries: Vec<DirectoryEntry>,
}

impl CameraDirectory {
    pub fn new(entries: Vec<DirectoryEntry>) -> Self {
        let entries = entries
            .into_iter()
            .filter(|e| e.nyc_uuid.as_deref().is_some_and(|id| !id.trim().is_empty()))
            .collect();
        Self { entries }
    }

    pub fn from_json(json: &str) -> RunResult<Self> {
        let file: DirectoryFile = serde_json::from_str(json)
            .map_err(|e| PipelineError::config_error(format!("Invalid camera directory: {}", e)))?;

        let entries = match file {
            DirectoryFile::Keyed(map) => map
                .into_iter()
                .map(|(key, mut entry)| {
                    if entry.zone_id.is_none() {
                        entry.zone_id = Some(key);
                    }
                    entry
                })
                .collect(),
            DirectoryFile::List(list) => list,
        };

        Ok(Self::new(entries))
    }

    pub fn load(path: &Path) -> RunResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::config_error(format!(
                "Failed to read camera directory {}: {}",
                path.display(),
                e
            ))
        })?;
        let directory = Self::from_json(&json)?;
        info!(path = %path.display(), entries = directory.len(), "Loaded camera directory");
        Ok(directory)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the entry for a camera: by camera id or handle first, then by zone.
    pub fn lookup(&self, camera: &CameraRecord) -> Option<&DirectoryEntry> {
        let mut needles = vec![camera.camera_id.as_str()];
        needles.extend(camera.handles.candidates());

        self.entries
            .iter()
            .find(|e| needles.iter().any(|n| e.matches_handle(n)))
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|e| e.zone_id.as_deref() == Some(camera.zone_id.as_str()))
            })
    }
}

/// Default resolver backed by the camera's own handles and a directory.
#[derive(Debug, Clone, Default)]
pub struct DirectoryResolver {
    directory: CameraDirectory,
}

impl DirectoryResolver {
    pub fn new(directory: CameraDirectory) -> Self {
        Self { directory }
    }

    pub fn resolve_sync(&self, camera: &CameraRecord) -> RunResult<String> {
        if let Some(id) = camera
            .handles
            .nyc_uuid
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
        {
            return Ok(id.to_string());
        }

        if let Some(handle) = camera.handles.candidates().find(|h| is_uuid_shaped(h)) {
            debug!(camera_id = %camera.camera_id, handle, "Resolved identifier from handle");
            return Ok(handle.to_string());
        }

        if let Some(id) = self
            .directory
            .lookup(camera)
            .and_then(|e| e.nyc_uuid.as_deref())
        {
            debug!(camera_id = %camera.camera_id, external_id = id, "Resolved identifier from directory");
            return Ok(id.to_string());
        }

        Err(PipelineError::identifier_not_found(&camera.camera_id))
    }
}

#[async_trait]
impl IdentifierResolver for DirectoryResolver {
    async fn resolve(&self, camera: &CameraRecord) -> RunResult<String> {
        self.resolve_sync(camera)
    }
}

fn is_uuid_shaped(s: &str) -> bool {
    Uuid::parse_str(s).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DIRECTORY: &str = r#"{
        "zone_b": {"zone_id": "z-7", "camera_handle": "cam-42", "handle": "cam-42",
                   "camera_name": "W 42 St @ 8 Ave", "borough": "Manhattan",
                   "nyc_uuid": "5e1f1b9c-0d2a-4c8e-9f0e-1a2b3c4d5e6f",
                   "coordinates": [-73.99, 40.75]},
        "zone_a": {"zone_id": "z-7", "camera_handle": "other", "camera_uuid": "zone-match-uuid"},
        "zone_c": {"zone_id": "z-9", "camera_handle": "no-id"}
    }"#;

    #[test]
    fn test_explicit_nyc_uuid_wins() {
        let resolver = DirectoryResolver::new(CameraDirectory::from_json(DIRECTORY).unwrap());
        let camera = CameraRecord::new("cam-42", "z-7").with_nyc_uuid("nyc-uuid-1");
        assert_eq!(resolver.resolve_sync(&camera).unwrap(), "nyc-uuid-1");
    }

    #[test]
    fn test_uuid_shaped_handle() {
        let resolver = DirectoryResolver::default();
        let mut camera = CameraRecord::new("cam-1", "z-1");
        camera.handles.camera_handle = Some("not-a-uuid".to_string());
        camera.handles.handle = Some("9bd74b87-32d1-4767-8081-86a2e83f28f2".to_string());
        assert_eq!(
            resolver.resolve_sync(&camera).unwrap(),
            "9bd74b87-32d1-4767-8081-86a2e83f28f2"
        );
    }

    #[test]
    fn test_directory_prefers_handle_over_zone() {
        let resolver = DirectoryResolver::new(CameraDirectory::from_json(DIRECTORY).unwrap());
        let camera = CameraRecord::new("cam-42", "z-7");
        assert_eq!(
            resolver.resolve_sync(&camera).unwrap(),
            "5e1f1b9c-0d2a-4c8e-9f0e-1a2b3c4d5e6f"
        );
    }

    #[test]
    fn test_directory_zone_match_and_alias() {
        let resolver = DirectoryResolver::new(CameraDirectory::from_json(DIRECTORY).unwrap());
        let camera = CameraRecord::new("cam-unknown", "z-7");
        // zone_a sorts before zone_b
        assert_eq!(resolver.resolve_sync(&camera).unwrap(), "zone-match-uuid");
    }

    #[test]
    fn test_entries_without_id_are_dropped() {
        let directory = CameraDirectory::from_json(DIRECTORY).unwrap();
        assert_eq!(directory.len(), 2);

        let resolver = DirectoryResolver::new(directory);
        let camera = CameraRecord::new("no-id", "z-9");
        assert!(matches!(
            resolver.resolve_sync(&camera),
            Err(PipelineError::IdentifierNotFound { .. })
        ));
    }

    #[test]
    fn test_list_format_and_file_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"zone_id": "z-3", "handle": "h-3", "nyc_uuid": "list-uuid"}}]"#
        )
        .unwrap();

        let directory = CameraDirectory::load(file.path()).unwrap();
        let mut camera = CameraRecord::new("cam-3", "z-0");
        camera.handles.handle = Some("h-3".to_string());
        assert_eq!(directory.lookup(&camera).and_then(|e| e.nyc_uuid.clone()), Some("list-uuid".to_string()));
    }

    #[test]
    fn test_invalid_directory_is_config_error() {
        assert!(matches!(
            CameraDirectory::from_json("[1, 2"),
            Err(PipelineError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_trait_resolve() {
        let resolver = DirectoryResolver::default();
        let camera = CameraRecord::new("cam-1", "z-1");
        assert!(resolver.resolve(&camera).await.is_err());
    }
}
