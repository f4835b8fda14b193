//! Minimal reader for Tiled's JSON map export: tile layers only.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TiledError {
    #[error("failed to read tilemap {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse tilemap json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("layer '{layer}' has {actual} tiles, expected {expected}")]
    TileCountMismatch {
        layer: String,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Clone, Deserialize)]
struct RawMap {
    width: u32,
    height: u32,
    tilewidth: u32,
    tileheight: u32,
    #[serde(default)]
    layers: Vec<RawLayer>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawLayer {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    pub name: String,
    tiles: Vec<u32>,
}

/// Row-major grid; tile id 0 means empty (Tiled's convention).
#[derive(Debug, Clone, PartialEq)]
pub struct TiledMap {
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    layers: Vec<TileLayer>,
}

impl TiledMap {
    pub fn load(path: &Path) -> Result<Self, TiledError> {
        let raw = fs::read_to_string(path).map_err(|source| TiledError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, TiledError> {
        let map: RawMap = serde_json::from_str(raw)?;
        let expected = map.width as usize * map.height as usize;
        let (tile_width, tile_height) = (map.tile_width_or_one(), map.tile_height_or_one());
        let mut layers = Vec::new();
        for layer in map.layers {
            if layer.kind != "tilelayer" {
                continue;
            }
            if layer.data.len() != expected {
                return Err(TiledError::TileCountMismatch {
                    layer: layer.name,
                    expected,
                    actual: layer.data.len(),
                });
            }
            layers.push(TileLayer {
                name: layer.name,
                tiles: layer.data,
            });
        }
        Ok(Self {
            width: map.width,
            height: map.height,
            tile_width,
            tile_height,
            layers,
        })
    }

    pub fn layers(&self) -> &[TileLayer] {
        &self.layers
    }

    /// Occupied cells of a layer as `(column, row, tile_id)`.
    pub fn occupied_cells<'a>(
        &'a self,
        layer: &'a TileLayer,
    ) -> impl Iterator<Item = (u32, u32, u32)> + 'a {
        let width = self.width.max(1);
        layer
            .tiles
            .iter()
            .enumerate()
            .filter(|(_, tile)| **tile != 0)
            .map(move |(index, tile)| (index as u32 % width, index as u32 / width, *tile))
    }
}

impl RawMap {
    fn tile_width_or_one(&self) -> u32 {
        self.tilewidth.max(1)
    }

    fn tile_height_or_one(&self) -> u32 {
        self.tileheight.max(1)
    }
}
