use crate::{
    camera::{
        model::{Camera, clamp_zoom},
        transition::CameraTransition,
    },
    foundation::core::{Point, ViewportSize},
};

/// Exponential zoom rate per unit of wheel delta.
pub const WHEEL_ZOOM_RATE: f64 = 0.0015;

/// What the pointer landed on when a gesture started.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerTarget {
    Background,
    Content,
    Handle,
    Modal,
}

/// Owns the live camera, pointer gestures and programmatic transitions.
///
/// Gesture handlers only mutate camera state; the next frame picks it up.
#[derive(Clone, Debug)]
pub struct CameraController {
    camera: Camera,
    transition: Option<CameraTransition>,
    interactive: bool,
    drag_last: Option<Point>,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(Camera::default())
    }
}

impl CameraController {
    pub fn new(camera: Camera) -> Self {
        Self {
            camera: camera.clamped(),
            transition: None,
            interactive: true,
            drag_last: None,
        }
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn transition(&self) -> Option<&CameraTransition> {
        self.transition.as_ref()
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
        if !interactive {
            self.drag_last = None;
        }
    }

    /// Direct camera write. Cancels any in-flight transition.
    pub fn set(&mut self, camera: Camera) {
        if self.transition.take().is_some() {
            tracing::debug!("camera transition cancelled by direct set");
        }
        self.camera = camera.clamped();
    }

    /// Start an eased move from the current camera to `to`.
    pub fn transition_to(&mut self, to: Camera, duration_ms: f64, now_ms: f64) {
        tracing::debug!(?to, duration_ms, "camera transition started");
        self.transition = Some(CameraTransition::new(now_ms, duration_ms, self.camera, to));
    }

    /// Advance an in-flight transition. Returns `true` while one is still running.
    pub fn advance(&mut self, now_ms: f64) -> bool {
        let Some(tr) = self.transition else {
            return false;
        };
        let (camera, done) = tr.sample(now_ms);
        self.camera = camera;
        if done {
            self.transition = None;
        }
        !done
    }

    pub fn pointer_down(&mut self, pos: Point, target: PointerTarget) {
        if !self.interactive || target != PointerTarget::Background {
            self.drag_last = None;
            return;
        }
        self.drag_last = Some(pos);
    }

    pub fn pointer_move(&mut self, pos: Point) {
        let Some(last) = self.drag_last else {
            return;
        };
        let delta = pos - last;
        self.drag_last = Some(pos);
        self.pan_by_screen_delta(delta.x, delta.y);
    }

    pub fn pointer_up(&mut self) {
        self.drag_last = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_last.is_some()
    }

    /// Pan by a screen-space delta (the world moves with the pointer).
    pub fn pan_by_screen_delta(&mut self, dx: f64, dy: f64) {
        if !self.interactive {
            return;
        }
        let mut next = self.camera;
        next.cx -= dx / next.zoom;
        next.cy -= dy / next.zoom;
        self.set(next);
    }

    /// Zoom around `cursor`, keeping the world point under it stationary.
    pub fn wheel(&mut self, cursor: Point, delta_y: f64, screen: ViewportSize) {
        if !self.interactive || !delta_y.is_finite() {
            return;
        }
        let before = self.camera.screen_to_world(cursor, screen);
        let mut next = self.camera;
        next.zoom = clamp_zoom(next.zoom * (-delta_y * WHEEL_ZOOM_RATE).exp());
        let after = next.screen_to_world(cursor, screen);
        next.cx += before.x - after.x;
        next.cy += before.y - after.y;
        self.set(next);
    }
}
