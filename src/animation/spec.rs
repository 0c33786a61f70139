use crate::{
    animation::ease::Ease,
    foundation::{
        error::{StageError, StageResult},
        math::clamp01,
    },
    scene::model::AnimSpec,
};

/// Duration used when a fade or pixelate spec omits `durationMs`.
pub const DEFAULT_DURATION_MS: f64 = 800.0;
pub const DEFAULT_BORDER_FRAC: f64 = 0.2;

/// Side a directional reveal starts from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RevealFrom {
    Left,
    Right,
    Top,
    Bottom,
    /// No direction: plain opacity fade.
    #[default]
    All,
}

impl RevealFrom {
    fn parse(s: &str) -> StageResult<Self> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" | "none" => Self::All,
            "left" => Self::Left,
            "right" => Self::Right,
            "top" => Self::Top,
            "bottom" => Self::Bottom,
            other => {
                return Err(StageError::validation(format!(
                    "unknown reveal direction '{other}'"
                )));
            }
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timing {
    pub duration_ms: f64,
    pub delay_ms: f64,
}

impl Timing {
    /// Linear progress since `anchor_ms + delay_ms`. Non-positive durations jump straight to 1
    /// once the delay has passed.
    pub fn progress(&self, anchor_ms: f64, now_ms: f64) -> f64 {
        let elapsed = now_ms - (anchor_ms + self.delay_ms);
        if self.duration_ms <= 0.0 {
            return if elapsed >= 0.0 { 1.0 } else { 0.0 };
        }
        clamp01(elapsed / self.duration_ms)
    }
}

/// A validated animation spec.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AnimEffect {
    None,
    Sudden,
    Fade {
        timing: Timing,
        ease: Ease,
        from: RevealFrom,
        border_frac: f64,
    },
    Pixelate {
        timing: Timing,
        /// Overrides the scene's default step count.
        steps: Option<u32>,
    },
}

impl AnimEffect {
    /// `true` for effects that take no time.
    pub fn is_instant(&self) -> bool {
        matches!(self, Self::None | Self::Sudden)
    }

    /// Whether an animation anchored at `anchor_ms` has run its full course by `now_ms`.
    pub fn finished_at(&self, anchor_ms: f64, now_ms: f64) -> bool {
        match self {
            Self::None | Self::Sudden => true,
            Self::Fade { timing, .. } | Self::Pixelate { timing, .. } => {
                timing.progress(anchor_ms, now_ms) >= 1.0
            }
        }
    }
}

fn finite_or(v: Option<f64>, default: f64, what: &str) -> StageResult<f64> {
    match v {
        None => Ok(default),
        Some(x) if x.is_finite() => Ok(x),
        Some(x) => Err(StageError::validation(format!("{what} must be finite, got {x}"))),
    }
}

/// Parse an authored [`AnimSpec`] into an [`AnimEffect`].
///
/// `from` accepts a compact `"side:frac"` form; an explicit `borderFrac` wins over it.
pub fn parse_anim(spec: &AnimSpec) -> StageResult<AnimEffect> {
    let kind = spec.kind.trim().to_ascii_lowercase();
    let timing = || -> StageResult<Timing> {
        Ok(Timing {
            duration_ms: finite_or(spec.duration_ms, DEFAULT_DURATION_MS, "durationMs")?,
            delay_ms: finite_or(spec.delay_ms, 0.0, "delayMs")?.max(0.0),
        })
    };

    match kind.as_str() {
        "" | "none" => Ok(AnimEffect::None),
        "sudden" | "instant" => Ok(AnimEffect::Sudden),
        "fade" => {
            let ease = match spec.easing.as_deref() {
                None => Ease::Linear,
                Some(s) => Ease::parse(s)?,
            };
            let (from, compact_frac) = match spec.from.as_deref() {
                None => (RevealFrom::All, None),
                Some(raw) => match raw.split_once(':') {
                    None => (RevealFrom::parse(raw)?, None),
                    Some((side, frac)) => {
                        let frac: f64 = frac.trim().parse().map_err(|_| {
                            StageError::validation(format!("invalid border fraction in '{raw}'"))
                        })?;
                        (RevealFrom::parse(side)?, Some(frac))
                    }
                },
            };
            let border_frac = finite_or(
                spec.border_frac.or(compact_frac),
                DEFAULT_BORDER_FRAC,
                "borderFrac",
            )?
            .clamp(0.0, 1.0);
            Ok(AnimEffect::Fade {
                timing: timing()?,
                ease,
                from,
                border_frac,
            })
        }
        "pixelate" => {
            if spec.steps == Some(0) {
                return Err(StageError::validation("pixelate steps must be > 0"));
            }
            Ok(AnimEffect::Pixelate {
                timing: timing()?,
                steps: spec.steps,
            })
        }
        other => Err(StageError::validation(format!(
            "unknown animation kind '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(kind: &str) -> AnimSpec {
        AnimSpec {
            kind: kind.to_string(),
            ..AnimSpec::default()
        }
    }

    #[test]
    fn fade_defaults() {
        let effect = parse_anim(&spec("fade")).unwrap();
        assert_eq!(
            effect,
            AnimEffect::Fade {
                timing: Timing {
                    duration_ms: DEFAULT_DURATION_MS,
                    delay_ms: 0.0
                },
                ease: Ease::Linear,
                from: RevealFrom::All,
                border_frac: DEFAULT_BORDER_FRAC,
            }
        );
    }

    #[test]
    fn compact_from_carries_border_fraction() {
        let mut s = spec("Fade");
        s.from = Some("left:0.3".to_string());
        let AnimEffect::Fade {
            from, border_frac, ..
        } = parse_anim(&s).unwrap()
        else {
            panic!("expected fade");
        };
        assert_eq!(from, RevealFrom::Left);
        assert_eq!(border_frac, 0.3);

        s.border_frac = Some(0.05);
        let AnimEffect::Fade { border_frac, .. } = parse_anim(&s).unwrap() else {
            panic!("expected fade");
        };
        assert_eq!(border_frac, 0.05);
    }

    #[test]
    fn pixelate_keeps_step_override() {
        let mut s = spec("pixelate");
        s.steps = Some(8);
        s.duration_ms = Some(0.0);
        assert_eq!(
            parse_anim(&s).unwrap(),
            AnimEffect::Pixelate {
                timing: Timing {
                    duration_ms: 0.0,
                    delay_ms: 0.0
                },
                steps: Some(8)
            }
        );
        s.steps = Some(0);
        assert!(parse_anim(&s).is_err());
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_anim(&spec("spin")).is_err());
        let mut s = spec("fade");
        s.from = Some("diagonal".to_string());
        assert!(parse_anim(&s).is_err());
        s.from = Some("left:wide".to_string());
        assert!(parse_anim(&s).is_err());
        let mut s = spec("fade");
        s.duration_ms = Some(f64::NAN);
        assert!(parse_anim(&s).is_err());
    }

    #[test]
    fn none_and_sudden_are_instant() {
        assert!(parse_anim(&spec("none")).unwrap().is_instant());
        assert!(parse_anim(&spec("sudden")).unwrap().is_instant());
    }

    #[test]
    fn timing_progress() {
        let t = Timing {
            duration_ms: 1000.0,
            delay_ms: 200.0,
        };
        assert_eq!(t.progress(0.0, 100.0), 0.0);
        assert_eq!(t.progress(0.0, 700.0), 0.5);
        assert_eq!(t.progress(0.0, 5000.0), 1.0);

        let instant = Timing {
            duration_ms: 0.0,
            delay_ms: 50.0,
        };
        assert_eq!(instant.progress(0.0, 49.0), 0.0);
        assert_eq!(instant.progress(0.0, 50.0), 1.0);
    }
}
