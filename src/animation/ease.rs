use crate::foundation::error::{StageError, StageResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Ease {
    #[default]
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
}

impl Ease {
    pub const ALL: [Self; 7] = [
        Self::Linear,
        Self::InQuad,
        Self::OutQuad,
        Self::InOutQuad,
        Self::InCubic,
        Self::OutCubic,
        Self::InOutCubic,
    ];

    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
        }
    }

    /// Accepts the variant names plus the usual CSS-style spellings (`ease-in-out`, `easeOut`).
    pub fn parse(s: &str) -> StageResult<Self> {
        let norm: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        Ok(match norm.as_str() {
            "" | "linear" => Self::Linear,
            "in" | "easein" | "inquad" | "easeinquad" => Self::InQuad,
            "out" | "easeout" | "outquad" | "easeoutquad" => Self::OutQuad,
            "ease" | "inout" | "easeinout" | "inoutquad" | "easeinoutquad" => Self::InOutQuad,
            "incubic" | "easeincubic" => Self::InCubic,
            "outcubic" | "easeoutcubic" => Self::OutCubic,
            "inoutcubic" | "easeinoutcubic" => Self::InOutCubic,
            _ => {
                return Err(StageError::validation(format!("unknown easing '{s}'")));
            }
        })
    }
}
