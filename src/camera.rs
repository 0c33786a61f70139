//! Camera state, world/screen projection, gestures and eased transitions.

pub mod controller;
pub mod model;
pub mod transition;

pub use controller::{CameraController, PointerTarget};
pub use model::{Camera, MAX_ZOOM, MIN_ZOOM, clamp_zoom};
pub use transition::{CameraTransition, raised_sine};
