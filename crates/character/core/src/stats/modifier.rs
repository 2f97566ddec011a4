//! Modifier curve - the sole conversion from raw stat points to effective power.
//!
//! Formula: `round(scale / (1 + e^(-steepness · (value - midpoint))) + offset)`
//!
//! With the standard constants the curve passes through zero at raw 0, has its
//! inflection point at raw 500 (modifier 735), and flattens towards -2265 and
//! +3735. Health and combat read only this value, never raw points.

/// Constants of the logistic modifier curve.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ModifierCurve {
    /// Distance between the two asymptotes.
    pub scale: f64,
    /// Growth rate of the logistic term.
    pub steepness: f64,
    /// Raw value at the inflection point.
    pub midpoint: f64,
    /// Vertical shift applied after the logistic term.
    pub offset: f64,
}

impl ModifierCurve {
    pub const STANDARD: Self = Self {
        scale: 6000.0,
        steepness: 0.001,
        midpoint: 500.0,
        offset: -2265.0,
    };

    /// Unrounded curve value; strictly increasing in `value`.
    pub fn exact(&self, value: i32) -> f64 {
        let exponent = -self.steepness * (f64::from(value) - self.midpoint);
        self.scale / (1.0 + exponent.exp()) + self.offset
    }

    /// Rounded modifier used by every downstream consumer.
    pub fn modifier(&self, value: i32) -> i32 {
        self.exact(value).round() as i32
    }

    /// Lower asymptote of the curve.
    pub fn floor(&self) -> f64 {
        self.offset
    }

    /// Upper asymptote of the curve.
    pub fn ceiling(&self) -> f64 {
        self.scale + self.offset
    }
}

impl Default for ModifierCurve {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Modifier of a raw value on the standard curve.
pub fn modifier(value: i32) -> i32 {
    ModifierCurve::STANDARD.modifier(value)
}
