//! Bracket asset loading.
//!
//! Assets live as RGBA PNG files in a directory, one per [`BracketKind`]
//! (`metal.png`, `ceramic.png`). The store resolves a kind to its file,
//! decodes it once per request, and hands the compositor an already-decoded
//! raster. Unknown keys and missing files are rejected here, before any
//! compositing starts, so those failures stay client-addressable errors
//! rather than mid-composite surprises.

use std::path::{Path, PathBuf};

use image::RgbaImage;
use log::debug;

use crate::compose::BracketKind;
use crate::error::OrtholayError;

/// A directory-backed store of bracket assets.
#[derive(Clone, Debug)]
pub struct AssetStore {
    root: PathBuf,
}

impl AssetStore {
    /// Creates a store rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the directory this store reads from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the file path that backs a bracket kind.
    pub fn path_for(&self, kind: BracketKind) -> PathBuf {
        self.root.join(kind.asset_file_name())
    }

    /// Loads the asset for a bracket kind, decoded to RGBA.
    ///
    /// # Errors
    /// Returns [`OrtholayError::MissingBracketAsset`] when the backing file
    /// does not exist, and [`OrtholayError::ImageDecode`] when it exists
    /// but cannot be decoded.
    pub fn load(&self, kind: BracketKind) -> Result<RgbaImage, OrtholayError> {
        let path = self.path_for(kind);
        if !path.is_file() {
            return Err(OrtholayError::MissingBracketAsset {
                kind: kind.to_string(),
                path,
            });
        }

        debug!("loading bracket asset {}", path.display());
        let asset = image::open(&path)
            .map_err(|source| OrtholayError::ImageDecode {
                path: path.clone(),
                source,
            })?
            .to_rgba8();

        Ok(asset)
    }

    /// Loads the asset for a raw bracket-type key.
    ///
    /// # Errors
    /// Returns [`OrtholayError::UnsupportedBracketType`] for a key outside
    /// the supported set, plus everything [`load`](Self::load) can return.
    pub fn load_key(&self, key: &str) -> Result<(BracketKind, RgbaImage), OrtholayError> {
        let kind = BracketKind::parse(key)
            .ok_or_else(|| OrtholayError::UnsupportedBracketType(key.to_string()))?;
        let asset = self.load(kind)?;
        Ok((kind, asset))
    }
}
