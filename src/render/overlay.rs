use std::{collections::HashMap, sync::Arc};

use image::RgbaImage;

use crate::{
    animation::Pixelation,
    foundation::error::StageResult,
    render::{
        backend::{ElementContent, ElementStyle, OverlayHost},
        pixelate,
    },
};

/// One retained overlay element.
#[derive(Clone, Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayElement {
    pub id: String,
    pub kind: String,
    pub shown: bool,
    pub style: Option<ElementStyle>,
    /// Stable slot that content updates write into.
    pub content: ElementContent,
    pub pixelation: Option<Pixelation>,
    /// Low-resolution rendition for the current pixelation step.
    #[serde(skip)]
    pub pixel_frame: Option<Arc<RgbaImage>>,
    /// How many times the pixelated rendition has been recomputed.
    pub pixel_redraws: u32,
}

impl OverlayElement {
    fn new(id: &str, kind: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: kind.to_string(),
            shown: false,
            style: None,
            content: ElementContent::Empty,
            pixelation: None,
            pixel_frame: None,
            pixel_redraws: 0,
        }
    }
}

/// In-memory [`OverlayHost`]; the default host and the one snapshots are rasterized from.
#[derive(Debug, Default)]
pub struct RetainedOverlay {
    elements: HashMap<String, OverlayElement>,
    diagnostic: Option<String>,
    style_writes: u64,
}

impl RetainedOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    pub fn style_writes(&self) -> u64 {
        self.style_writes
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Shown elements in stacking order.
    pub fn shown_elements(&self) -> Vec<&OverlayElement> {
        let mut shown: Vec<_> = self
            .elements
            .values()
            .filter(|e| e.shown && e.style.is_some())
            .collect();
        shown.sort_by(|a, b| {
            let za = a.style.as_ref().map_or(0, |s| s.z);
            let zb = b.style.as_ref().map_or(0, |s| s.z);
            za.cmp(&zb).then_with(|| a.id.cmp(&b.id))
        });
        shown
    }

    /// All elements sorted by id.
    pub fn elements(&self) -> Vec<&OverlayElement> {
        let mut all: Vec<_> = self.elements.values().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }
}

impl OverlayHost for RetainedOverlay {
    type Element = OverlayElement;

    fn is_attached(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    fn attach(&mut self, id: &str, kind: &str) {
        self.elements
            .entry(id.to_string())
            .or_insert_with(|| OverlayElement::new(id, kind));
    }

    fn hide(&mut self, id: &str) {
        if let Some(el) = self.elements.get_mut(id) {
            el.shown = false;
        }
    }

    fn apply_style(&mut self, id: &str, style: &ElementStyle) {
        if let Some(el) = self.elements.get_mut(id) {
            el.shown = true;
            el.style = Some(style.clone());
            self.style_writes += 1;
        }
    }

    fn set_pixelation(
        &mut self,
        id: &str,
        pixelation: Option<Pixelation>,
        source: Option<&RgbaImage>,
    ) -> StageResult<()> {
        let Some(el) = self.elements.get_mut(id) else {
            return Ok(());
        };
        let Some(p) = pixelation else {
            el.pixelation = None;
            el.pixel_frame = None;
            return Ok(());
        };
        if el.pixelation == Some(p) && (el.pixel_frame.is_some() || source.is_none()) {
            return Ok(());
        }
        el.pixelation = Some(p);
        el.pixel_frame = match (source, el.style.as_ref()) {
            (Some(src), Some(style)) => {
                let box_w = style.rect.width.round().max(1.0) as u32;
                let box_h = style.rect.height.round().max(1.0) as u32;
                el.pixel_redraws += 1;
                Some(Arc::new(pixelate::downsample(
                    src, box_w, box_h, p.step, p.steps,
                )))
            }
            _ => None,
        };
        Ok(())
    }

    fn set_content(&mut self, id: &str, content: ElementContent) {
        if let Some(el) = self.elements.get_mut(id) {
            el.content = content;
        }
    }

    fn show_diagnostic(&mut self, message: &str) {
        self.diagnostic = Some(message.to_string());
    }

    fn element(&self, id: &str) -> Option<&OverlayElement> {
        self.elements.get(id)
    }
}
