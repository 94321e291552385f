//! File-backed scene persistence.
//!
//! Layout inside the store directory:
//! ```text
//! scenes/
//!   <name>.scene.json   - pretty-printed scene document
//!   <name>.meta.json    - schema version and SHA-256 of the scene file
//! ```

use std::path::{Path, PathBuf};

use cellops_ecs::ComponentError;
use cellops_kernel::{GameConfig, Scene};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::document::{SceneDocument, SceneLoadError};

const SCENE_SCHEMA_VERSION: u32 = 1;
const SCENE_SUFFIX: &str = ".scene.json";
const META_SUFFIX: &str = ".meta.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to capture scene: {0}")]
    Capture(#[from] ComponentError),
    #[error(transparent)]
    Load(#[from] SceneLoadError),
    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },
    #[error("schema version mismatch: file has v{file_version}, expected v{expected_version}")]
    SchemaMismatch {
        file_version: u32,
        expected_version: u32,
    },
    #[error("no scene named `{0}`")]
    NotFound(String),
    #[error("invalid scene name `{0}`")]
    InvalidName(String),
}

/// Stored next to each scene file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneMeta {
    pub schema_version: u32,
    pub sha256: String,
    pub entity_count: usize,
    pub light_count: usize,
}

/// A directory of named scene files.
#[derive(Debug)]
pub struct SceneStore {
    root: PathBuf,
}

impl SceneStore {
    /// Open or create a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = path.as_ref().to_path_buf();
        std::fs::create_dir_all(root.join("scenes"))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn save(&self, name: &str, scene: &Scene) -> Result<SceneMeta, StoreError> {
        let document = SceneDocument::capture(scene)?;
        self.save_document(name, &document)
    }

    pub fn save_document(&self, name: &str, document: &SceneDocument) -> Result<SceneMeta, StoreError> {
        let (scene_path, meta_path) = self.paths(name)?;
        let text = document.to_json_pretty()?;
        let meta = SceneMeta {
            schema_version: SCENE_SCHEMA_VERSION,
            sha256: sha256_hex(text.as_bytes()),
            entity_count: document.objects.len(),
            light_count: document.lights.len(),
        };
        std::fs::write(&scene_path, &text)?;
        serde_json::to_writer_pretty(std::fs::File::create(&meta_path)?, &meta)?;
        tracing::info!(name, path = %scene_path.display(), entities = meta.entity_count, "scene saved");
        Ok(meta)
    }

    pub fn meta(&self, name: &str) -> Result<SceneMeta, StoreError> {
        let (scene_path, meta_path) = self.paths(name)?;
        if !scene_path.exists() || !meta_path.exists() {
            return Err(StoreError::NotFound(name.to_owned()));
        }
        let meta: SceneMeta = serde_json::from_reader(std::fs::File::open(&meta_path)?)?;
        if meta.schema_version != SCENE_SCHEMA_VERSION {
            return Err(StoreError::SchemaMismatch {
                file_version: meta.schema_version,
                expected_version: SCENE_SCHEMA_VERSION,
            });
        }
        Ok(meta)
    }

    /// Read and verify a scene document without building a scene.
    pub fn load_document(&self, name: &str) -> Result<SceneDocument, StoreError> {
        let meta = self.meta(name)?;
        let (scene_path, _) = self.paths(name)?;
        let bytes = std::fs::read(&scene_path)?;
        let actual = sha256_hex(&bytes);
        if actual != meta.sha256 {
            return Err(StoreError::IntegrityMismatch {
                expected: meta.sha256,
                actual,
            });
        }
        Ok(SceneDocument::from_slice(&bytes)?)
    }

    pub fn load(&self, name: &str, config: GameConfig) -> Result<Scene, StoreError> {
        let scene = self.load_document(name)?.restore(config)?;
        tracing::info!(name, entities = scene.entity_count(), "scene loaded");
        Ok(scene)
    }

    /// Names of stored scenes, sorted.
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(self.root.join("scenes"))? {
            let file_name = entry?.file_name();
            if let Some(name) = file_name.to_str().and_then(|f| f.strip_suffix(SCENE_SUFFIX)) {
                names.push(name.to_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    fn paths(&self, name: &str) -> Result<(PathBuf, PathBuf), StoreError> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidName(name.to_owned()));
        }
        let dir = self.root.join("scenes");
        Ok((
            dir.join(format!("{name}{SCENE_SUFFIX}")),
            dir.join(format!("{name}{META_SUFFIX}")),
        ))
    }
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> Scene {
        let mut scene = Scene::new(GameConfig::default());
        let holder = scene.create_entity("List Of Targets");
        let lung = scene.create_entity("Lung");
        scene.add_child(holder, lung).unwrap();
        scene
    }

    #[test]
    fn open_creates_scene_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SceneStore::open(tmp.path().join("data")).unwrap();
        assert!(store.root().join("scenes").is_dir());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn save_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SceneStore::open(tmp.path()).unwrap();
        let original = scene();

        let meta = store.save("level_1", &original).unwrap();
        assert_eq!(meta.entity_count, 3);
        assert_eq!(meta.schema_version, SCENE_SCHEMA_VERSION);
        assert_eq!(store.list().unwrap(), vec!["level_1".to_owned()]);

        let reopened = SceneStore::open(tmp.path()).unwrap();
        let loaded = reopened.load("level_1", GameConfig::default()).unwrap();
        assert_eq!(loaded.entity_count(), 3);
        let lung = loaded.find_by_name("Lung").unwrap();
        let holder = loaded.find_by_name("List Of Targets").unwrap();
        assert_eq!(loaded.entity(lung).unwrap().parent(), Some(holder));
    }

    #[test]
    fn corruption_fails_closed() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SceneStore::open(tmp.path()).unwrap();
        store.save("level", &scene()).unwrap();

        let path = tmp.path().join("scenes").join("level.scene.json");
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, text.replace("Lung", "Lunk")).unwrap();

        assert!(matches!(
            store.load("level", GameConfig::default()),
            Err(StoreError::IntegrityMismatch { .. })
        ));
    }

    #[test]
    fn schema_mismatch_fails_closed() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SceneStore::open(tmp.path()).unwrap();
        let mut meta = store.save("level", &scene()).unwrap();
        meta.schema_version = 999;
        let meta_path = tmp.path().join("scenes").join("level.meta.json");
        serde_json::to_writer_pretty(std::fs::File::create(&meta_path).unwrap(), &meta).unwrap();

        match store.load_document("level") {
            Err(StoreError::SchemaMismatch {
                file_version,
                expected_version,
            }) => {
                assert_eq!(file_version, 999);
                assert_eq!(expected_version, SCENE_SCHEMA_VERSION);
            }
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn missing_and_invalid_names() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SceneStore::open(tmp.path()).unwrap();
        assert!(matches!(store.load_document("nope"), Err(StoreError::NotFound(_))));
        assert!(matches!(
            store.save("../escape", &scene()),
            Err(StoreError::InvalidName(_))
        ));
    }
}
