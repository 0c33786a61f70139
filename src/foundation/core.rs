use crate::foundation::error::{StageError, StageResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Size of the visible drawing area in device pixels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

impl ViewportSize {
    pub fn new(width: f64, height: f64) -> StageResult<Self> {
        if !(width.is_finite() && height.is_finite()) || width < 1.0 || height < 1.0 {
            return Err(StageError::validation(format!(
                "viewport must be at least 1x1 pixels, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    pub fn center(self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn rect(self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Integer pixel dimensions, rounded up.
    pub fn pixel_dims(self) -> (u32, u32) {
        (self.width.ceil() as u32, self.height.ceil() as u32)
    }
}

/// Straight (non-premultiplied) RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Scale alpha by `factor` (clamped to `0..=1`).
    pub fn with_alpha_factor(self, factor: f64) -> Self {
        let f = factor.clamp(0.0, 1.0);
        Self {
            a: (f64::from(self.a) * f).round() as u8,
            ..self
        }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn parse_hex(s: &str) -> StageResult<Self> {
        let hex = s
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| StageError::validation(format!("color '{s}' must start with '#'")))?;
        if !hex.is_ascii() {
            return Err(StageError::validation(format!("invalid hex color '{s}'")));
        }
        let digit = |i: usize| -> StageResult<u8> {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| StageError::validation(format!("invalid hex color '{s}'")))
        };
        match hex.len() {
            3 => {
                let mut out = [0u8; 3];
                for (i, c) in hex.chars().enumerate() {
                    let v = c
                        .to_digit(16)
                        .ok_or_else(|| StageError::validation(format!("invalid hex color '{s}'")))?
                        as u8;
                    out[i] = v * 17;
                }
                Ok(Self::new(out[0], out[1], out[2], 255))
            }
            6 => Ok(Self::new(digit(0)?, digit(2)?, digit(4)?, 255)),
            8 => Ok(Self::new(digit(0)?, digit(2)?, digit(4)?, digit(6)?)),
            _ => Err(StageError::validation(format!(
                "hex color '{s}' must have 3, 6 or 8 digits"
            ))),
        }
    }

    pub fn to_premul(self) -> [u8; 4] {
        fn premul(c: u8, a: u8) -> u8 {
            (((u16::from(c) * u16::from(a)) + 127) / 255) as u8
        }
        [
            premul(self.r, self.a),
            premul(self.g, self.a),
            premul(self.b, self.a),
            self.a,
        ]
    }
}
