//! Probability value types.
//!
//! Model estimates and ground-truth ranges arrive in two units: fractions in
//! `[0, 1]` and percentages in `[0, 100]`. Each unit gets its own type so a
//! value can only cross from one to the other through
//! [`Percentage::to_probability`].

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised when a value falls outside its domain
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProbabilityError {
    #[error("probability must be in [0, 1], got {0}")]
    OutOfRange(f64),

    #[error("percentage must be in [0, 100], got {0}")]
    PercentageOutOfRange(f64),

    #[error("outcome must be 0 or 1, got {0}")]
    InvalidOutcome(u8),

    #[error("range low bound {low} exceeds high bound {high}")]
    InvertedRange { low: f64, high: f64 },

    #[error("log loss epsilon must be in (0, 0.5), got {0}")]
    InvalidEpsilon(f64),
}

/// Round to a fixed number of decimal digits, ties to even
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// A probability expressed as a fraction in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Probability(f64);

impl Probability {
    /// Construct a probability, rejecting anything outside `[0, 1]`
    ///
    /// # Errors
    ///
    /// Returns `ProbabilityError::OutOfRange` for values outside `[0, 1]` or NaN.
    pub fn new(value: f64) -> Result<Self, ProbabilityError> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ProbabilityError::OutOfRange(value))
        }
    }

    /// Raw fractional value
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Express as a percentage (for display and percentage-unit records)
    #[must_use]
    pub fn to_percentage(self) -> Percentage {
        Percentage(self.0 * 100.0)
    }
}

impl TryFrom<f64> for Probability {
    type Error = ProbabilityError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Probability> for f64 {
    fn from(p: Probability) -> Self {
        p.0
    }
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}%", self.0 * 100.0)
    }
}

/// A probability expressed in percentage points, `[0, 100]`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Percentage(f64);

impl Percentage {
    /// Construct a percentage, rejecting anything outside `[0, 100]`
    ///
    /// # Errors
    ///
    /// Returns `ProbabilityError::PercentageOutOfRange` for values outside
    /// `[0, 100]` or NaN.
    pub fn new(value: f64) -> Result<Self, ProbabilityError> {
        if (0.0..=100.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ProbabilityError::PercentageOutOfRange(value))
        }
    }

    /// Raw percentage value
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Convert to a fraction. This is the only percentage-to-fraction path.
    #[must_use]
    pub fn to_probability(self) -> Probability {
        Probability(self.0 / 100.0)
    }
}

impl TryFrom<f64> for Percentage {
    type Error = ProbabilityError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percentage> for f64 {
    fn from(p: Percentage) -> Self {
        p.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Realized binary outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum BinaryOutcome {
    /// Event did not happen (0)
    Negative,
    /// Event happened (1)
    Positive,
}

impl BinaryOutcome {
    /// Numeric value used by the scoring rules
    #[must_use]
    pub const fn value(self) -> f64 {
        match self {
            Self::Negative => 0.0,
            Self::Positive => 1.0,
        }
    }
}

impl TryFrom<u8> for BinaryOutcome {
    type Error = ProbabilityError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Negative),
            1 => Ok(Self::Positive),
            other => Err(ProbabilityError::InvalidOutcome(other)),
        }
    }
}

impl From<BinaryOutcome> for u8 {
    fn from(outcome: BinaryOutcome) -> Self {
        match outcome {
            BinaryOutcome::Negative => 0,
            BinaryOutcome::Positive => 1,
        }
    }
}

/// Closed interval of fractional probabilities, `low <= high`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct ProbabilityRange {
    low: Probability,
    high: Probability,
}

impl ProbabilityRange {
    /// Construct a range from validated endpoints
    ///
    /// # Errors
    ///
    /// Returns `ProbabilityError::InvertedRange` when `low > high`.
    pub fn new(low: Probability, high: Probability) -> Result<Self, ProbabilityError> {
        if low.0 > high.0 {
            return Err(ProbabilityError::InvertedRange {
                low: low.0,
                high: high.0,
            });
        }
        Ok(Self { low, high })
    }

    /// Construct a range from raw fractions
    ///
    /// # Errors
    ///
    /// Returns an error if either endpoint is outside `[0, 1]` or `low > high`.
    pub fn from_fractions(low: f64, high: f64) -> Result<Self, ProbabilityError> {
        Self::new(Probability::new(low)?, Probability::new(high)?)
    }

    /// Lower bound
    #[must_use]
    pub const fn low(&self) -> Probability {
        self.low
    }

    /// Upper bound
    #[must_use]
    pub const fn high(&self) -> Probability {
        self.high
    }

    /// Inclusive containment test
    #[must_use]
    pub fn contains(&self, p: Probability) -> bool {
        self.low.0 <= p.0 && p.0 <= self.high.0
    }

    /// Distance from `p` to the nearest endpoint, zero when inside
    #[must_use]
    pub fn distance_to(&self, p: Probability) -> f64 {
        if self.contains(p) {
            0.0
        } else {
            (p.0 - self.low.0).abs().min((p.0 - self.high.0).abs())
        }
    }

    /// Closed-interval overlap test
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.low.0 <= other.high.0 && self.high.0 >= other.low.0
    }

    /// Midpoint of the interval
    #[must_use]
    pub fn midpoint(&self) -> Probability {
        Probability((self.low.0 + self.high.0) / 2.0)
    }

    /// Express both ends in percentage points
    #[must_use]
    pub fn to_percentage_range(&self) -> PercentageRange {
        PercentageRange {
            low: self.low.to_percentage(),
            high: self.high.to_percentage(),
        }
    }
}

impl TryFrom<[f64; 2]> for ProbabilityRange {
    type Error = ProbabilityError;

    fn try_from([low, high]: [f64; 2]) -> Result<Self, Self::Error> {
        Self::from_fractions(low, high)
    }
}

impl From<ProbabilityRange> for [f64; 2] {
    fn from(range: ProbabilityRange) -> Self {
        [range.low.0, range.high.0]
    }
}

/// Closed interval in percentage points, `low <= high`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct PercentageRange {
    low: Percentage,
    high: Percentage,
}

impl PercentageRange {
    /// Construct a range from raw percentages
    ///
    /// # Errors
    ///
    /// Returns an error if either endpoint is outside `[0, 100]` or `low > high`.
    pub fn new(low: f64, high: f64) -> Result<Self, ProbabilityError> {
        let low = Percentage::new(low)?;
        let high = Percentage::new(high)?;
        if low.0 > high.0 {
            return Err(ProbabilityError::InvertedRange {
                low: low.0,
                high: high.0,
            });
        }
        Ok(Self { low, high })
    }

    /// Lower bound
    #[must_use]
    pub const fn low(&self) -> Percentage {
        self.low
    }

    /// Upper bound
    #[must_use]
    pub const fn high(&self) -> Percentage {
        self.high
    }

    /// Convert both endpoints to fractions
    #[must_use]
    pub fn to_probability_range(&self) -> ProbabilityRange {
        ProbabilityRange {
            low: self.low.to_probability(),
            high: self.high.to_probability(),
        }
    }
}

impl TryFrom<[f64; 2]> for PercentageRange {
    type Error = ProbabilityError;

    fn try_from([low, high]: [f64; 2]) -> Result<Self, Self::Error> {
        Self::new(low, high)
    }
}

impl From<PercentageRange> for [f64; 2] {
    fn from(range: PercentageRange) -> Self {
        [range.low.0, range.high.0]
    }
}

impl fmt::Display for PercentageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.low, self.high)
    }
}
