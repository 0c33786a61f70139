//! Image readiness tracking. Loading happens outside the engine; each frame polls the store.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use image::RgbaImage;

use crate::foundation::error::StageResult;

#[derive(Clone, Debug)]
pub enum ImageStatus {
    Pending,
    Ready(Arc<RgbaImage>),
    Failed(String),
}

/// Image sources keyed by their `src` string.
#[derive(Debug, Default)]
pub struct ImageStore {
    images: HashMap<String, ImageStatus>,
}

impl ImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in `src`. Returns `true` the first time a source is seen, so the
    /// caller knows to start a load.
    pub fn request(&mut self, src: &str) -> bool {
        if self.images.contains_key(src) {
            return false;
        }
        self.images.insert(src.to_string(), ImageStatus::Pending);
        true
    }

    pub fn complete(&mut self, src: &str, image: RgbaImage) {
        tracing::debug!(src, w = image.width(), h = image.height(), "image ready");
        self.images
            .insert(src.to_string(), ImageStatus::Ready(Arc::new(image)));
    }

    pub fn fail(&mut self, src: &str, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(src, %reason, "image load failed");
        self.images
            .insert(src.to_string(), ImageStatus::Failed(reason));
    }

    pub fn status(&self, src: &str) -> Option<&ImageStatus> {
        self.images.get(src)
    }

    pub fn is_ready(&self, src: &str) -> bool {
        matches!(self.images.get(src), Some(ImageStatus::Ready(_)))
    }

    pub fn get(&self, src: &str) -> Option<&Arc<RgbaImage>> {
        match self.images.get(src) {
            Some(ImageStatus::Ready(img)) => Some(img),
            _ => None,
        }
    }

    /// Sources that were requested and are still waiting.
    pub fn pending(&self) -> Vec<String> {
        let mut out: Vec<_> = self
            .images
            .iter()
            .filter(|(_, s)| matches!(s, ImageStatus::Pending))
            .map(|(k, _)| k.clone())
            .collect();
        out.sort();
        out
    }

    /// Synchronously load every pending source from files under `root`.
    ///
    /// Failures are recorded per source rather than returned.
    pub fn load_pending_from_dir(&mut self, root: &Path) {
        for src in self.pending() {
            match load_image_file(&resolve_src(root, &src)) {
                Ok(img) => self.complete(&src, img),
                Err(err) => self.fail(&src, err.to_string()),
            }
        }
    }
}

fn resolve_src(root: &Path, src: &str) -> PathBuf {
    root.join(src.trim_start_matches('/'))
}

pub fn decode_image(bytes: &[u8]) -> StageResult<RgbaImage> {
    let img = image::load_from_memory(bytes).context("decode image from memory")?;
    Ok(img.to_rgba8())
}

pub fn load_image_file(path: &Path) -> StageResult<RgbaImage> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    decode_image(&bytes)
}
