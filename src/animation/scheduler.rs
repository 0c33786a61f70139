use std::collections::HashMap;

use crate::{
    animation::{
        mask::RevealMask,
        spec::{AnimEffect, RevealFrom, parse_anim},
    },
    foundation::math::clamp01,
    scene::model::{AnimSpec, Node},
};

/// Timing bookkeeping for one direction (enter or exit) of one node.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationState {
    /// Clock origin; recorded on the first frame the animation is eligible to run.
    pub anchor_ms: Option<f64>,
    pub done: bool,
    /// Waiting for an image before the clock may start.
    pub pending_resource: bool,
    pub last_step: Option<u32>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AnimPhase {
    #[default]
    Idle,
    Entering,
    Exiting,
    /// Exit finished; the node should no longer be seen.
    Exited,
}

/// Quantized pixelation level: `step` of `steps`, where `steps` means full resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Pixelation {
    pub step: u32,
    pub steps: u32,
}

/// Per-frame visual output for one node.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualState {
    /// Node opacity multiplied by the animation's opacity.
    pub opacity: f64,
    pub mask: Option<RevealMask>,
    pub pixelation: Option<Pixelation>,
    pub phase: AnimPhase,
}

impl VisualState {
    fn resting(node_opacity: f64) -> Self {
        Self {
            opacity: node_opacity,
            mask: None,
            pixelation: None,
            phase: AnimPhase::Idle,
        }
    }

    fn exited() -> Self {
        Self {
            opacity: 0.0,
            mask: None,
            pixelation: None,
            phase: AnimPhase::Exited,
        }
    }
}

/// Inputs beyond the node itself that drive one evaluation.
#[derive(Clone, Copy, Debug)]
pub struct FrameClock {
    pub now_ms: f64,
    pub animations_enabled: bool,
    /// Step count for pixelate specs without an override.
    pub default_steps: u32,
}

#[derive(Clone, Debug, Default)]
struct NodeTrack {
    prev_visible: bool,
    enter: Option<AnimationState>,
    exit: Option<AnimationState>,
    exit_marker: Option<f64>,
}

/// Step reached after progress `p`, never above `steps`.
pub fn pixel_step(p: f64, steps: u32) -> u32 {
    let p = clamp01(p);
    if p >= 1.0 {
        return steps;
    }
    ((p * f64::from(steps)).floor() as u32).min(steps)
}

/// Per-node enter/exit state machines, keyed by node id.
///
/// Evaluating a node is idempotent for a fixed `now_ms`: repeated calls within one frame (or
/// across frames with a frozen clock) return the same state.
#[derive(Debug, Default)]
pub struct AnimationScheduler {
    tracks: HashMap<String, NodeTrack>,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all transient state for `id`. The next visible evaluation counts as a fresh
    /// visibility edge.
    pub fn clear(&mut self, id: &str) {
        if self.tracks.remove(id).is_some() {
            tracing::debug!(node = id, "animation state cleared");
        }
    }

    pub fn clear_all(&mut self) {
        self.tracks.clear();
    }

    pub fn enter_state(&self, id: &str) -> Option<AnimationState> {
        self.tracks.get(id).and_then(|t| t.enter)
    }

    pub fn exit_state(&self, id: &str) -> Option<AnimationState> {
        self.tracks.get(id).and_then(|t| t.exit)
    }

    /// Whether the exit animation started at `marker` has run to completion.
    pub fn exit_done(&self, id: &str, marker: f64) -> bool {
        self.tracks
            .get(id)
            .is_some_and(|t| t.exit_marker == Some(marker) && t.exit.is_some_and(|s| s.done))
    }

    /// Finish the exit of a culled node, judged by elapsed time alone. Returns whether the
    /// exit is complete.
    pub fn settle_unseen_exit(&mut self, node: &Node, clock: FrameClock) -> bool {
        let (Some(start), Some(spec)) = (node.exit_start_ms, &node.disappear) else {
            return false;
        };
        let finished = !clock.animations_enabled
            || effect_or_none(&node.id, spec).finished_at(start, clock.now_ms);
        if !finished {
            return false;
        }
        let track = self.tracks.entry(node.id.clone()).or_default();
        if track.exit_marker != Some(start) {
            track.exit_marker = Some(start);
            track.exit = None;
        }
        let state = track.exit.get_or_insert_with(AnimationState::default);
        state.anchor_ms.get_or_insert(start);
        if !state.done {
            tracing::debug!(node = %node.id, "exit finished off screen");
            state.done = true;
        }
        true
    }

    /// Advance and sample the animation of a visible, non-culled node.
    ///
    /// `resource_ready` is false while the node's image is still loading.
    pub fn evaluate(&mut self, node: &Node, resource_ready: bool, clock: FrameClock) -> VisualState {
        let base = if node.opacity.is_finite() {
            node.opacity.clamp(0.0, 1.0)
        } else {
            1.0
        };
        let track = self.tracks.entry(node.id.clone()).or_default();

        if !track.prev_visible {
            tracing::debug!(node = %node.id, "visibility edge");
            *track = NodeTrack {
                prev_visible: true,
                ..NodeTrack::default()
            };
        }
        if track.exit_marker != node.exit_start_ms {
            track.exit = None;
            track.exit_marker = node.exit_start_ms;
        }

        let exit = match (node.exit_start_ms, &node.disappear) {
            (Some(start), Some(spec)) => Some((start, effect_or_none(&node.id, spec))),
            _ => None,
        };

        let mut out = if let Some((start, effect)) = exit {
            let state = track.exit.get_or_insert_with(AnimationState::default);
            if clock.animations_enabled {
                exit_frame(state, &effect, start, resource_ready, clock)
            } else {
                state.done = true;
                VisualState::exited()
            }
        } else {
            let effect = node
                .appear
                .as_ref()
                .map_or(AnimEffect::None, |spec| effect_or_none(&node.id, spec));
            if effect.is_instant() {
                VisualState::resting(1.0)
            } else if !clock.animations_enabled {
                // Settle it so re-enabling does not replay the entrance mid-show.
                track.enter.get_or_insert_with(AnimationState::default).done = true;
                VisualState::resting(1.0)
            } else {
                let state = track.enter.get_or_insert_with(AnimationState::default);
                enter_frame(state, &effect, resource_ready, clock)
            }
        };

        if out.phase == AnimPhase::Exited {
            tracing::debug!(node = %node.id, "exit complete");
        }
        out.opacity = clamp01(out.opacity * base);
        out
    }
}

fn effect_or_none(id: &str, spec: &AnimSpec) -> AnimEffect {
    match parse_anim(spec) {
        Ok(effect) => effect,
        Err(err) => {
            tracing::warn!(node = id, %err, "ignoring invalid animation spec");
            AnimEffect::None
        }
    }
}

fn enter_frame(
    state: &mut AnimationState,
    effect: &AnimEffect,
    resource_ready: bool,
    clock: FrameClock,
) -> VisualState {
    if state.done {
        return VisualState::resting(1.0);
    }
    match *effect {
        AnimEffect::None | AnimEffect::Sudden => {
            state.done = true;
            VisualState::resting(1.0)
        }
        AnimEffect::Fade {
            timing,
            ease,
            from,
            border_frac,
        } => {
            let anchor = *state.anchor_ms.get_or_insert(clock.now_ms);
            let p = timing.progress(anchor, clock.now_ms);
            if p >= 1.0 {
                state.done = true;
                return VisualState::resting(1.0);
            }
            let eased = ease.apply(p);
            let (opacity, mask) = fade_visual(from, eased, border_frac);
            VisualState {
                opacity,
                mask,
                pixelation: None,
                phase: AnimPhase::Entering,
            }
        }
        AnimEffect::Pixelate { timing, steps } => {
            let steps = steps.unwrap_or(clock.default_steps).max(1);
            if !resource_ready {
                state.pending_resource = true;
                return VisualState {
                    opacity: 0.0,
                    mask: None,
                    pixelation: Some(Pixelation { step: 0, steps }),
                    phase: AnimPhase::Entering,
                };
            }
            state.pending_resource = false;
            let anchor = *state.anchor_ms.get_or_insert(clock.now_ms);
            let raw = pixel_step(timing.progress(anchor, clock.now_ms), steps);
            let step = state.last_step.map_or(raw, |last| raw.max(last));
            state.last_step = Some(step);
            if step >= steps {
                state.done = true;
                return VisualState::resting(1.0);
            }
            VisualState {
                opacity: 1.0,
                mask: None,
                pixelation: Some(Pixelation { step, steps }),
                phase: AnimPhase::Entering,
            }
        }
    }
}

fn exit_frame(
    state: &mut AnimationState,
    effect: &AnimEffect,
    start_ms: f64,
    resource_ready: bool,
    clock: FrameClock,
) -> VisualState {
    if state.done {
        return VisualState::exited();
    }
    match *effect {
        AnimEffect::None | AnimEffect::Sudden => {
            state.done = true;
            VisualState::exited()
        }
        AnimEffect::Fade {
            timing,
            ease,
            from,
            border_frac,
        } => {
            let anchor = *state.anchor_ms.get_or_insert(start_ms);
            let p = timing.progress(anchor, clock.now_ms);
            if p >= 1.0 {
                state.done = true;
                return VisualState::exited();
            }
            let (opacity, mask) = fade_visual(from, 1.0 - ease.apply(p), border_frac);
            VisualState {
                opacity,
                mask,
                pixelation: None,
                phase: AnimPhase::Exiting,
            }
        }
        AnimEffect::Pixelate { timing, steps } => {
            // Nothing on screen to dissolve yet.
            if !resource_ready {
                state.done = true;
                return VisualState::exited();
            }
            let steps = steps.unwrap_or(clock.default_steps).max(1);
            let anchor = *state.anchor_ms.get_or_insert(start_ms);
            let raw = steps - pixel_step(timing.progress(anchor, clock.now_ms), steps);
            let step = state.last_step.map_or(raw, |last| raw.min(last));
            state.last_step = Some(step);
            if step == 0 {
                state.done = true;
                return VisualState::exited();
            }
            VisualState {
                opacity: 1.0,
                mask: None,
                pixelation: (step < steps).then_some(Pixelation { step, steps }),
                phase: AnimPhase::Exiting,
            }
        }
    }
}

/// Opacity and mask for a fade at visible fraction `q`.
fn fade_visual(from: RevealFrom, q: f64, border_frac: f64) -> (f64, Option<RevealMask>) {
    match from {
        RevealFrom::All => (q, None),
        side => (1.0, Some(RevealMask::for_fraction(side, q, border_frac))),
    }
}
