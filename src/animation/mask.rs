use crate::{animation::spec::RevealFrom, foundation::math::clamp01};

/// A directional reveal: fully opaque behind a sweeping edge, fading to transparent over a
/// trailing band.
///
/// Coordinates are normalized to the node box, `(0, 0)` top-left, `(1, 1)` bottom-right.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealMask {
    pub from: RevealFrom,
    /// Leading edge position along the sweep axis, in `[0, 1 + band]`.
    pub edge: f64,
    pub band: f64,
}

impl RevealMask {
    /// Mask for a visible fraction `q` (0 = hidden, 1 = fully shown).
    pub fn for_fraction(from: RevealFrom, q: f64, band: f64) -> Self {
        let band = clamp01(band);
        Self {
            from,
            edge: clamp01(q) * (1.0 + band),
            band,
        }
    }

    /// Visible fraction this mask was built for, the inverse of [`RevealMask::for_fraction`].
    pub fn revealed(&self) -> f64 {
        clamp01(self.edge / (1.0 + self.band))
    }

    pub fn solid_until(&self) -> f64 {
        self.edge - self.band
    }

    /// Distance along the sweep axis, measured from the side the reveal starts at.
    fn axis(&self, u: f64, v: f64) -> f64 {
        match self.from {
            RevealFrom::Left | RevealFrom::All => u,
            RevealFrom::Right => 1.0 - u,
            RevealFrom::Top => v,
            RevealFrom::Bottom => 1.0 - v,
        }
    }

    /// Mask alpha in `[0, 1]` at normalized box coordinates.
    pub fn coverage(&self, u: f64, v: f64) -> f64 {
        let t = self.axis(u, v);
        if t >= self.edge {
            return 0.0;
        }
        let solid = self.solid_until();
        if t <= solid || self.band <= 0.0 {
            return 1.0;
        }
        clamp01((self.edge - t) / self.band)
    }

    /// The mask as a CSS `mask-image` value, for hosts that forward it to a browser.
    pub fn css_gradient(&self) -> String {
        let dir = match self.from {
            RevealFrom::Left | RevealFrom::All => "to right",
            RevealFrom::Right => "to left",
            RevealFrom::Top => "to bottom",
            RevealFrom::Bottom => "to top",
        };
        format!(
            "linear-gradient({dir}, rgba(0,0,0,1) {:.2}%, rgba(0,0,0,0) {:.2}%)",
            self.solid_until() * 100.0,
            self.edge * 100.0
        )
    }
}
