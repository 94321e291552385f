use cellops_ecs::ComponentError;
use cellops_kernel::{GameConfig, Scene};
use serde::{Deserialize, Serialize};

use crate::document::{SceneDocument, SceneLoadError};

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to capture scene: {0}")]
    Capture(#[from] ComponentError),
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("snapshot corrupted: expected hash {expected:016x}, got {actual:016x}")]
    Corrupted { expected: u64, actual: u64 },
    #[error(transparent)]
    Load(#[from] SceneLoadError),
    #[error("play mode is already active")]
    AlreadyPlaying,
    #[error("play mode is not active")]
    NotPlaying,
}

/// The edit-mode scene captured when play mode begins, with the config it
/// ran under and a content hash for corruption detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaySnapshot {
    pub document: SceneDocument,
    pub config: GameConfig,
    /// FNV-1a over the serialized document.
    pub hash: u64,
}

impl PlaySnapshot {
    pub fn capture(scene: &Scene) -> Result<Self, SnapshotError> {
        let document = SceneDocument::capture(scene)?;
        let hash = content_hash(&document)?;
        Ok(Self {
            document,
            config: scene.config().clone(),
            hash,
        })
    }

    pub fn verify(&self) -> Result<(), SnapshotError> {
        let actual = content_hash(&self.document)?;
        if actual != self.hash {
            return Err(SnapshotError::Corrupted {
                expected: self.hash,
                actual,
            });
        }
        Ok(())
    }

    /// Verify, rebuild the scene and awake it.
    pub fn restore(&self) -> Result<Scene, SnapshotError> {
        self.verify()?;
        let mut scene = self.document.restore(self.config.clone())?;
        scene.awake();
        Ok(scene)
    }
}

/// Editor play mode: entering captures the scene, leaving throws away
/// whatever play did and hands back the captured scene.
#[derive(Debug, Default)]
pub struct PlaySession {
    snapshot: Option<PlaySnapshot>,
}

impl PlaySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn snapshot(&self) -> Option<&PlaySnapshot> {
        self.snapshot.as_ref()
    }

    pub fn enter(&mut self, scene: &Scene) -> Result<(), SnapshotError> {
        if self.is_active() {
            return Err(SnapshotError::AlreadyPlaying);
        }
        let snapshot = PlaySnapshot::capture(scene)?;
        tracing::info!(
            entities = snapshot.document.objects.len(),
            hash = format_args!("{:016x}", snapshot.hash),
            "entered play mode"
        );
        self.snapshot = Some(snapshot);
        Ok(())
    }

    /// Leave play mode. On error the snapshot is kept so the caller can retry
    /// or inspect it.
    pub fn exit(&mut self) -> Result<Scene, SnapshotError> {
        let snapshot = self.snapshot.as_ref().ok_or(SnapshotError::NotPlaying)?;
        let scene = snapshot.restore()?;
        self.snapshot = None;
        tracing::info!(entities = scene.entity_count(), "left play mode");
        Ok(scene)
    }
}

fn content_hash(document: &SceneDocument) -> Result<u64, serde_json::Error> {
    let bytes = serde_json::to_vec(document)?;
    Ok(fnv1a_hash(&bytes))
}

fn fnv1a_hash(data: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in data {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}
