use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::asset_keys::{validate_asset_key, AssetKeyError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssetKind {
    Image,
    Spritesheet { frame_width: u32, frame_height: u32 },
    Audio,
    TilemapJson,
}

impl AssetKind {
    pub fn is_drawable(self) -> bool {
        matches!(self, Self::Image | Self::Spritesheet { .. })
    }

    fn label(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Spritesheet { .. } => "spritesheet",
            Self::Audio => "audio",
            Self::TilemapJson => "tilemap_json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEntry {
    pub key: String,
    pub path: PathBuf,
    #[serde(flatten)]
    pub kind: AssetKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("invalid asset key '{key}': {source}")]
    InvalidKey {
        key: String,
        #[source]
        source: AssetKeyError,
    },
    #[error("asset path for '{key}' must be relative and stay inside the project root: {path}")]
    InvalidPath { key: String, path: PathBuf },
    #[error("spritesheet '{key}' must have non-zero frame size, got {frame_width}x{frame_height}")]
    InvalidFrameSize {
        key: String,
        frame_width: u32,
        frame_height: u32,
    },
    #[error("asset key '{key}' already registered as {existing_kind} at {existing_path}")]
    Conflict {
        key: String,
        existing_kind: &'static str,
        existing_path: PathBuf,
    },
}

/// Key-addressed manifest of every asset a scene preloads.
///
/// Registering the same key twice with an identical entry is a no-op so a
/// scene that preloads again after a restart does not fail.
#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
    entries: BTreeMap<String, AssetEntry>,
}

impl AssetRegistry {
    pub fn register(&mut self, key: &str, path: &str, kind: AssetKind) -> Result<(), AssetError> {
        validate_asset_key(key).map_err(|source| AssetError::InvalidKey {
            key: key.to_string(),
            source,
        })?;
        let path = normalize_asset_path(key, path)?;
        if let AssetKind::Spritesheet {
            frame_width,
            frame_height,
        } = kind
        {
            if frame_width == 0 || frame_height == 0 {
                return Err(AssetError::InvalidFrameSize {
                    key: key.to_string(),
                    frame_width,
                    frame_height,
                });
            }
        }

        let entry = AssetEntry {
            key: key.to_string(),
            path,
            kind,
        };
        if let Some(existing) = self.entries.get(key) {
            if *existing == entry {
                return Ok(());
            }
            return Err(AssetError::Conflict {
                key: key.to_string(),
                existing_kind: existing.kind.label(),
                existing_path: existing.path.clone(),
            });
        }
        self.entries.insert(entry.key.clone(), entry);
        Ok(())
    }

    pub fn image(&mut self, key: &str, path: &str) -> Result<(), AssetError> {
        self.register(key, path, AssetKind::Image)
    }

    pub fn spritesheet(
        &mut self,
        key: &str,
        path: &str,
        frame_width: u32,
        frame_height: u32,
    ) -> Result<(), AssetError> {
        self.register(
            key,
            path,
            AssetKind::Spritesheet {
                frame_width,
                frame_height,
            },
        )
    }

    pub fn audio(&mut self, key: &str, path: &str) -> Result<(), AssetError> {
        self.register(key, path, AssetKind::Audio)
    }

    pub fn tilemap_json(&mut self, key: &str, path: &str) -> Result<(), AssetError> {
        self.register(key, path, AssetKind::TilemapJson)
    }

    pub fn get(&self, key: &str) -> Option<&AssetEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetEntry> {
        self.entries.values()
    }

    pub fn resolve_path(&self, root: &Path, key: &str) -> Option<PathBuf> {
        self.entries.get(key).map(|entry| root.join(&entry.path))
    }

    pub fn missing_on_disk(&self, root: &Path) -> Vec<&AssetEntry> {
        self.entries
            .values()
            .filter(|entry| !root.join(&entry.path).is_file())
            .collect()
    }
}

fn normalize_asset_path(key: &str, raw: &str) -> Result<PathBuf, AssetError> {
    let invalid = || AssetError::InvalidPath {
        key: key.to_string(),
        path: PathBuf::from(raw),
    };
    let mut normalized = PathBuf::new();
    for component in Path::new(raw).components() {
        match component {
            Component::CurDir => {}
            Component::Normal(part) => normalized.push(part),
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(invalid())
            }
        }
    }
    if normalized.as_os_str().is_empty() {
        return Err(invalid());
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn registers_each_kind_by_key() {
        let mut registry = AssetRegistry::default();
        registry
            .image("forest", "assets/backgrounds/forest.png")
            .expect("image");
        registry
            .spritesheet("player", "assets/sprites/cyborg.png", 47, 50)
            .expect("sheet");
        registry
            .audio("gg", "assets/audio/SadTrombone.mp3")
            .expect("audio");
        registry
            .tilemap_json("map", "assets/backgrounds/robot-test-map.json")
            .expect("map");

        assert_eq!(registry.len(), 4);
        assert_eq!(
            registry.get("player").map(|entry| entry.kind),
            Some(AssetKind::Spritesheet {
                frame_width: 47,
                frame_height: 50
            })
        );
        assert!(!registry.get("gg").expect("gg").kind.is_drawable());
    }

    #[test]
    fn leading_dot_segment_is_normalized() {
        let mut registry = AssetRegistry::default();
        registry
            .image("gameOver", "./assets/backgrounds/gg.jpg")
            .expect("image");
        assert_eq!(
            registry.get("gameOver").expect("entry").path,
            PathBuf::from("assets/backgrounds/gg.jpg")
        );
    }

    #[test]
    fn rejects_escaping_paths_and_bad_keys() {
        let mut registry = AssetRegistry::default();
        assert!(matches!(
            registry.image("x", "../secret.png"),
            Err(AssetError::InvalidPath { .. })
        ));
        assert!(matches!(
            registry.image("x", "/abs.png"),
            Err(AssetError::InvalidPath { .. })
        ));
        assert!(matches!(
            registry.image("bad key", "a.png"),
            Err(AssetError::InvalidKey { .. })
        ));
        assert!(matches!(
            registry.spritesheet("sheet", "a.png", 0, 10),
            Err(AssetError::InvalidFrameSize { .. })
        ));
    }

    #[test]
    fn identical_reregistration_is_idempotent_but_conflicts_fail() {
        let mut registry = AssetRegistry::default();
        registry.image("arrow", "assets/backgrounds/arrow.png").expect("first");
        registry
            .image("arrow", "assets/backgrounds/arrow.png")
            .expect("repeat");
        let error = registry
            .image("arrow", "assets/backgrounds/other.png")
            .expect_err("conflict");
        assert!(matches!(error, AssetError::Conflict { existing_kind: "image", .. }));
    }

    #[test]
    fn missing_on_disk_lists_absent_files_only() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(temp.path().join("assets")).expect("assets dir");
        fs::write(temp.path().join("assets/present.png"), b"png").expect("write");

        let mut registry = AssetRegistry::default();
        registry.image("present", "assets/present.png").expect("present");
        registry.image("absent", "assets/absent.png").expect("absent");

        let missing = registry
            .missing_on_disk(temp.path())
            .into_iter()
            .map(|entry| entry.key.as_str())
            .collect::<Vec<_>>();
        assert_eq!(missing, vec!["absent"]);
    }

    #[test]
    fn entries_serialize_with_flattened_kind() {
        let entry = AssetEntry {
            key: "wolf".to_string(),
            path: PathBuf::from("assets/sprites/wolf.png"),
            kind: AssetKind::Spritesheet {
                frame_width: 68,
                frame_height: 68,
            },
        };
        let value = serde_json::to_value(&entry).expect("json");
        assert_eq!(value["kind"], "spritesheet");
        assert_eq!(value["frame_width"], 68);
        let back: AssetEntry = serde_json::from_value(value).expect("decode");
        assert_eq!(back, entry);
    }
}
