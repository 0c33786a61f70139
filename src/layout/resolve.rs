use std::collections::HashMap;

use crate::{
    foundation::core::{Affine, Point},
    scene::model::{Anchor, LocalTransform, Node, Space},
};

/// A node's effective geometry in its native space, recomputed every frame.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTransform {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub rotation_deg: f64,
    pub anchor: Option<Anchor>,
}

impl From<&LocalTransform> for ResolvedTransform {
    fn from(t: &LocalTransform) -> Self {
        Self {
            x: t.x,
            y: t.y,
            w: t.w,
            h: t.h,
            rotation_deg: t.rotation_deg,
            anchor: t.anchor,
        }
    }
}

impl ResolvedTransform {
    /// Compose a child's local transform into this (parent) frame.
    ///
    /// The parent's height is the scale unit; the child's offset is rotated by the parent's
    /// rotation.
    pub fn compose_child(&self, local: &LocalTransform) -> Self {
        let s = self.h;
        let offset = Affine::rotate(self.rotation_deg.to_radians())
            * Point::new(local.x * s, local.y * s);
        Self {
            x: self.x + offset.x,
            y: self.y + offset.y,
            w: local.w * s,
            h: local.h * s,
            rotation_deg: self.rotation_deg + local.rotation_deg,
            anchor: local.anchor.or(self.anchor),
        }
    }
}

/// Per-frame parent-chain resolver over the flat node list.
///
/// Build one per frame: the memo assumes the model and ancestors do not change while it is
/// alive.
pub struct TransformResolver<'a> {
    nodes: &'a [Node],
    index: HashMap<&'a str, usize>,
    memo: Vec<Option<ResolvedTransform>>,
    in_progress: Vec<bool>,
    // Set when a parent cycle is detected; holds the re-entered node until the recursion
    // unwinds back to it.
    open_cycle: Option<usize>,
}

impl<'a> TransformResolver<'a> {
    pub fn new(nodes: &'a [Node]) -> Self {
        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect();
        Self {
            nodes,
            index,
            memo: vec![None; nodes.len()],
            in_progress: vec![false; nodes.len()],
            open_cycle: None,
        }
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn resolve_id(&mut self, id: &str) -> Option<ResolvedTransform> {
        let idx = self.index_of(id)?;
        Some(self.resolve(idx))
    }

    /// Resolve the node at `idx` (an index into the slice given to [`Self::new`]).
    pub fn resolve(&mut self, idx: usize) -> ResolvedTransform {
        if let Some(done) = self.memo[idx] {
            return done;
        }
        let node = &self.nodes[idx];
        let local = ResolvedTransform::from(&node.transform);

        if self.in_progress[idx] {
            tracing::warn!(node = %node.id, "parent cycle detected; using local transform");
            self.open_cycle = Some(idx);
            return local;
        }

        let Some(parent_idx) = self.parent_index(node) else {
            self.memo[idx] = Some(local);
            return local;
        };

        self.in_progress[idx] = true;
        let parent = self.resolve(parent_idx);
        self.in_progress[idx] = false;

        let resolved = match self.open_cycle {
            // This node sits on the cycle that is still unwinding.
            Some(reentered) => {
                if reentered == idx {
                    self.open_cycle = None;
                }
                local
            }
            None => parent.compose_child(&node.transform),
        };
        self.memo[idx] = Some(resolved);
        resolved
    }

    fn parent_index(&self, node: &Node) -> Option<usize> {
        if node.space != Space::World {
            return None;
        }
        let parent_id = node.parent_id.as_deref()?;
        let Some(parent_idx) = self.index_of(parent_id) else {
            tracing::warn!(node = %node.id, parent = parent_id, "parent not found; ignoring");
            return None;
        };
        if self.nodes[parent_idx].space != Space::World {
            tracing::warn!(node = %node.id, parent = parent_id, "screen-space parent ignored");
            return None;
        }
        Some(parent_idx)
    }
}
