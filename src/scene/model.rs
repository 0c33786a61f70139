use std::collections::HashSet;

use crate::{
    camera::Camera,
    foundation::{
        core::Rgba8,
        error::{StageError, StageResult},
    },
};

/// Coordinate space a node's local transform is expressed in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Space {
    /// Panned and zoomed by the camera.
    #[default]
    World,
    /// Fractions of the fixed viewport.
    Screen,
}

/// Which point of a node's box its declared position refers to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Anchor {
    #[default]
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Anchor {
    /// Anchor position as fractions `(fx, fy)` of the box size.
    pub fn fraction(self) -> (f64, f64) {
        match self {
            Self::TopLeft => (0.0, 0.0),
            Self::TopCenter => (0.5, 0.0),
            Self::TopRight => (1.0, 0.0),
            Self::CenterLeft => (0.0, 0.5),
            Self::Center => (0.5, 0.5),
            Self::CenterRight => (1.0, 0.5),
            Self::BottomLeft => (0.0, 1.0),
            Self::BottomCenter => (0.5, 1.0),
            Self::BottomRight => (1.0, 1.0),
        }
    }

    /// Lenient parser for authored anchor names (`topLeft`, `top-left`, `lowerRight`, ...).
    pub fn parse(s: &str) -> Option<Self> {
        let norm: String = s
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase()
            .replace("lower", "bottom")
            .replace("upper", "top")
            .replace("middle", "center");
        Some(match norm.as_str() {
            "topleft" => Self::TopLeft,
            "top" | "topcenter" => Self::TopCenter,
            "topright" => Self::TopRight,
            "left" | "centerleft" | "leftcenter" => Self::CenterLeft,
            "center" | "centercenter" => Self::Center,
            "right" | "centerright" | "rightcenter" => Self::CenterRight,
            "bottomleft" => Self::BottomLeft,
            "bottom" | "bottomcenter" => Self::BottomCenter,
            "bottomright" => Self::BottomRight,
            _ => return None,
        })
    }
}

/// A node's authored geometry, in its native space.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalTransform {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    #[serde(default)]
    pub rotation_deg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<Anchor>,
}

impl LocalTransform {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            x,
            y,
            w,
            h,
            rotation_deg: 0.0,
            anchor: None,
        }
    }

    fn is_finite(&self) -> bool {
        [self.x, self.y, self.w, self.h, self.rotation_deg]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Authored enter/exit animation. Parsed into a typed effect by
/// [`crate::animation::spec::parse_anim`].
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimSpec {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub easing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_frac: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg_alpha: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<f64>,
}

impl NodeStyle {
    /// Background color with `bg_alpha` applied, if a color is set.
    pub fn background(&self) -> StageResult<Option<Rgba8>> {
        let Some(raw) = self.bg_color.as_deref() else {
            return Ok(None);
        };
        let color = Rgba8::parse_hex(raw)?;
        Ok(Some(color.with_alpha_factor(self.bg_alpha.unwrap_or(1.0))))
    }
}

/// Type-specific node content. Opaque to geometry and animation.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeContent {
    Text {
        #[serde(default)]
        text: String,
    },
    Image {
        src: String,
    },
    Qr {
        #[serde(default = "default_qr_url")]
        url: String,
    },
    HtmlFrame {
        src: String,
    },
    Bullets {
        #[serde(default)]
        items: Vec<String>,
    },
    Table {
        #[serde(default)]
        rows: Vec<Vec<String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delimiter: Option<String>,
    },
    Line(VectorStyle),
    Arrow(VectorStyle),
    #[serde(other)]
    Unknown,
}

fn default_qr_url() -> String {
    "/join".to_string()
}

impl NodeContent {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
            Self::Qr { .. } => "qr",
            Self::HtmlFrame { .. } => "htmlFrame",
            Self::Bullets { .. } => "bullets",
            Self::Table { .. } => "table",
            Self::Line(_) => "line",
            Self::Arrow(_) => "arrow",
            Self::Unknown => "unknown",
        }
    }

    /// Lines and arrows are drawn on the canvas rather than as overlay elements.
    pub fn is_vector(&self) -> bool {
        matches!(self, Self::Line(_) | Self::Arrow(_))
    }

    /// Image source whose readiness gates pixelation, if any.
    pub fn image_src(&self) -> Option<&str> {
        match self {
            Self::Image { src } => Some(src),
            _ => None,
        }
    }
}

/// Stroke parameters for canvas-drawn lines and arrows.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorStyle {
    #[serde(default = "default_stroke")]
    pub stroke: String,
    /// Stroke width in world units (pixels at zoom 1).
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
}

impl Default for VectorStyle {
    fn default() -> Self {
        Self {
            stroke: default_stroke(),
            stroke_width: default_stroke_width(),
        }
    }
}

fn default_stroke() -> String {
    "#ffffff".to_string()
}

fn default_stroke_width() -> f64 {
    4.0
}

fn default_true() -> bool {
    true
}

fn default_opacity() -> f64 {
    1.0
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub space: Space,
    pub transform: LocalTransform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appear: Option<AnimSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disappear: Option<AnimSpec>,
    /// Timestamp at which a controller started this node's exit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_start_ms: Option<f64>,
    #[serde(default)]
    pub style: NodeStyle,
    #[serde(flatten)]
    pub content: NodeContent,
}

impl Node {
    pub fn new(id: impl Into<String>, transform: LocalTransform, content: NodeContent) -> Self {
        Self {
            id: id.into(),
            space: Space::World,
            transform,
            parent_id: None,
            visible: true,
            opacity: 1.0,
            appear: None,
            disappear: None,
            exit_start_ms: None,
            style: NodeStyle::default(),
            content,
        }
    }
}

/// Engine-wide defaults carried with a scene.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SceneDefaults {
    pub design_width: f64,
    pub design_height: f64,
    pub view_transition_ms: f64,
    pub pixelate_steps: u32,
}

impl Default for SceneDefaults {
    fn default() -> Self {
        Self {
            design_width: 1920.0,
            design_height: 1080.0,
            view_transition_ms: 4000.0,
            pixelate_steps: 20,
        }
    }
}

/// A named camera position plus the nodes shown there.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    pub id: String,
    #[serde(default)]
    pub camera: Camera,
    #[serde(default)]
    pub show: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_ms: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub views: Vec<View>,
    #[serde(default)]
    pub defaults: SceneDefaults,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_view_id: Option<String>,
}

impl Scene {
    pub fn from_json(s: &str) -> StageResult<Self> {
        let scene: Self = serde_json::from_str(s)?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn view(&self, id: &str) -> Option<&View> {
        self.views.iter().find(|v| v.id == id)
    }

    pub fn validate(&self) -> StageResult<()> {
        if self.defaults.pixelate_steps == 0 {
            return Err(StageError::validation("defaults.pixelateSteps must be > 0"));
        }
        if !(self.defaults.design_width > 0.0 && self.defaults.design_height > 0.0) {
            return Err(StageError::validation(
                "defaults.designWidth/designHeight must be > 0",
            ));
        }

        let mut seen = HashSet::new();
        for node in &self.nodes {
            if node.id.trim().is_empty() {
                return Err(StageError::validation("node id must be non-empty"));
            }
            if !seen.insert(node.id.as_str()) {
                return Err(StageError::validation(format!(
                    "duplicate node id '{}'",
                    node.id
                )));
            }
            if !node.transform.is_finite() {
                return Err(StageError::validation(format!(
                    "node '{}' has a non-finite transform",
                    node.id
                )));
            }
            if !node.opacity.is_finite() {
                return Err(StageError::validation(format!(
                    "node '{}' has a non-finite opacity",
                    node.id
                )));
            }
            for spec in [&node.appear, &node.disappear].into_iter().flatten() {
                crate::animation::spec::parse_anim(spec).map_err(|e| {
                    StageError::validation(format!("node '{}': {e}", node.id))
                })?;
            }
            node.style.background().map_err(|e| {
                StageError::validation(format!("node '{}': {e}", node.id))
            })?;
        }

        let mut view_ids = HashSet::new();
        for view in &self.views {
            if !view_ids.insert(view.id.as_str()) {
                return Err(StageError::validation(format!(
                    "duplicate view id '{}'",
                    view.id
                )));
            }
        }
        if let Some(initial) = &self.initial_view_id
            && !view_ids.contains(initial.as_str())
        {
            return Err(StageError::validation(format!(
                "initialViewId '{initial}' does not name a view"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r##"{
        "nodes": [
            { "id": "title", "type": "text", "text": "Hello $x$",
              "transform": { "x": 10, "y": 20, "w": 300, "h": 80, "anchor": "center" },
              "appear": { "kind": "fade", "durationMs": 500, "from": "left" },
              "style": { "bgColor": "#112233", "bgAlpha": 0.5 } },
            { "id": "hud", "type": "qr", "space": "screen",
              "transform": { "x": 0.9, "y": 0.1, "w": 0.1, "h": 0.1 } },
            { "id": "child", "type": "chart", "parentId": "title",
              "transform": { "x": 0.5, "y": 0, "w": 1, "h": 1, "rotationDeg": 45 } },
            { "id": "a1", "type": "arrow", "strokeWidth": 6,
              "transform": { "x": 0, "y": 0, "w": 100, "h": 20 } }
        ],
        "views": [ { "id": "home", "camera": { "cx": 0, "cy": 0, "zoom": 1 }, "show": ["title"] } ],
        "initialViewId": "home"
    }"##;

    #[test]
    fn scene_json_parses_with_defaults() {
        let scene = Scene::from_json(SCENE).unwrap();
        assert_eq!(scene.nodes.len(), 4);
        assert_eq!(scene.defaults, SceneDefaults::default());

        let title = scene.node("title").unwrap();
        assert_eq!(title.space, Space::World);
        assert!(title.visible);
        assert_eq!(title.transform.anchor, Some(Anchor::Center));
        assert_eq!(
            title.style.background().unwrap(),
            Some(Rgba8::new(0x11, 0x22, 0x33, 128))
        );

        let hud = scene.node("hud").unwrap();
        assert_eq!(hud.space, Space::Screen);
        assert_eq!(
            hud.content,
            NodeContent::Qr {
                url: "/join".to_string()
            }
        );

        assert_eq!(scene.node("child").unwrap().content, NodeContent::Unknown);
        let NodeContent::Arrow(style) = &scene.node("a1").unwrap().content else {
            panic!("expected arrow");
        };
        assert_eq!(style.stroke_width, 6.0);
        assert_eq!(style.stroke, "#ffffff");
    }

    #[test]
    fn json_roundtrip_keeps_content() {
        let scene = Scene::from_json(SCENE).unwrap();
        let s = serde_json::to_string(&scene).unwrap();
        let de = Scene::from_json(&s).unwrap();
        assert_eq!(de.node("title"), scene.node("title"));
    }

    #[test]
    fn validate_rejects_duplicate_ids() {
        let mut scene = Scene::from_json(SCENE).unwrap();
        scene.nodes[1].id = "title".to_string();
        assert!(scene.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_animation_kind() {
        let mut scene = Scene::from_json(SCENE).unwrap();
        scene.nodes[0].appear = Some(AnimSpec {
            kind: "spin".to_string(),
            ..AnimSpec::default()
        });
        let err = scene.validate().unwrap_err();
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn validate_rejects_missing_initial_view() {
        let mut scene = Scene::from_json(SCENE).unwrap();
        scene.initial_view_id = Some("nowhere".to_string());
        assert!(scene.validate().is_err());
    }

    #[test]
    fn anchor_parse_accepts_aliases() {
        assert_eq!(Anchor::parse("topLeft"), Some(Anchor::TopLeft));
        assert_eq!(Anchor::parse("lower-right"), Some(Anchor::BottomRight));
        assert_eq!(Anchor::parse("center"), Some(Anchor::Center));
        assert_eq!(Anchor::parse("middle_left"), Some(Anchor::CenterLeft));
        assert_eq!(Anchor::parse("sideways"), None);
    }
}
