//! Probability extraction from free-text model responses.
//!
//! Extraction is a priority-ordered chain of independent matchers. The first
//! matcher that produces an estimate wins:
//!
//! 1. [`RangeMatcher`]: "70-80%", "65% to 75%", "60 to 70 percent"
//! 2. [`PercentageMatcher`]: "75%", "80 percent" (0 and 100 are skipped)
//! 3. [`DecimalMatcher`]: "probability of 0.75", "likelihood ~0.6"
//!
//! This is pattern matching, not language understanding. Finding nothing is
//! a normal result and is reported as `None`.
//!
//! ## Example
//!
//! ```rust
//! use calibration_eval::extract::parse_probability_from_response;
//!
//! let estimate = parse_probability_from_response("The probability is 70-80%").unwrap();
//! assert!((estimate.point_estimate.value() - 0.75).abs() < 1e-9);
//! assert!(estimate.range.is_some());
//! ```

use crate::probability::{Percentage, Probability, ProbabilityRange};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Which matcher produced an estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Explicit numeric range
    Range,
    /// Single percentage
    Percentage,
    /// Decimal fraction near a trigger word
    Decimal,
}

/// A probability estimate found in text
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "EstimateRecord")]
pub struct ProbabilityEstimate {
    /// Point estimate (midpoint when a range was given)
    pub point_estimate: Probability,
    /// Range the text stated, if any
    pub range: Option<ProbabilityRange>,
    /// Matcher that fired
    pub method: ExtractionMethod,
}

#[derive(Serialize)]
struct EstimateRecord {
    point_estimate: Probability,
    range_low: Option<Probability>,
    range_high: Option<Probability>,
    method: ExtractionMethod,
}

impl From<ProbabilityEstimate> for EstimateRecord {
    fn from(estimate: ProbabilityEstimate) -> Self {
        Self {
            point_estimate: estimate.point_estimate,
            range_low: estimate.range.map(|r| r.low()),
            range_high: estimate.range.map(|r| r.high()),
            method: estimate.method,
        }
    }
}

/// One tier of the extraction chain
pub trait ProbabilityMatcher: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Try to find an estimate in `text`
    fn find(&self, text: &str) -> Option<ProbabilityEstimate>;
}

// The leading `(?:^|[^0-9.])` keeps "5.25%" from reading as 25%; the regex
// crate has no lookbehind.
fn range_regex() -> &'static Regex {
    static INSTANCE: OnceLock<Regex> = OnceLock::new();
    INSTANCE.get_or_init(|| {
        Regex::new(r"(?i)(?:^|[^0-9.])([0-9]{1,3})\s*(?:%|percent)?\s*(?:-|to)\s*([0-9]{1,3})\s*(?:%|percent)")
            .expect("range pattern is valid")
    })
}

fn percentage_regex() -> &'static Regex {
    static INSTANCE: OnceLock<Regex> = OnceLock::new();
    INSTANCE.get_or_init(|| {
        Regex::new(r"(?i)(?:^|[^0-9.])([0-9]{1,3})\s*(?:%|percent)")
            .expect("percentage pattern is valid")
    })
}

fn decimal_regex() -> &'static Regex {
    static INSTANCE: OnceLock<Regex> = OnceLock::new();
    INSTANCE.get_or_init(|| {
        Regex::new(r"(?i)(?:probability|likelihood|chance|estimate)[^0-9]*?(0\.[0-9]{1,4})")
            .expect("decimal pattern is valid")
    })
}

/// Matches "70-80%" style ranges; the midpoint becomes the point estimate.
///
/// Only the first range-shaped span in the text is considered. If its bounds
/// are out of order or above 100 the tier yields nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct RangeMatcher;

impl ProbabilityMatcher for RangeMatcher {
    fn name(&self) -> &'static str {
        "range"
    }

    fn find(&self, text: &str) -> Option<ProbabilityEstimate> {
        let caps = range_regex().captures(text)?;
        let low: f64 = caps.get(1)?.as_str().parse().ok()?;
        let high: f64 = caps.get(2)?.as_str().parse().ok()?;
        if low >= high {
            return None;
        }

        let low = Percentage::new(low).ok()?.to_probability();
        let high = Percentage::new(high).ok()?.to_probability();
        let range = ProbabilityRange::new(low, high).ok()?;

        Some(ProbabilityEstimate {
            point_estimate: range.midpoint(),
            range: Some(range),
            method: ExtractionMethod::Range,
        })
    }
}

/// Matches the first percentage strictly between 0 and 100.
///
/// "0%" and "100%" are usually rhetorical ("lost 100% of its gains") rather
/// than probability statements.
#[derive(Debug, Default, Clone, Copy)]
pub struct PercentageMatcher;

impl ProbabilityMatcher for PercentageMatcher {
    fn name(&self) -> &'static str {
        "percentage"
    }

    fn find(&self, text: &str) -> Option<ProbabilityEstimate> {
        percentage_regex()
            .captures_iter(text)
            .filter_map(|caps| caps.get(1)?.as_str().parse::<f64>().ok())
            .find(|value| (1.0..=99.0).contains(value))
            .and_then(|value| Percentage::new(value).ok())
            .map(|pct| ProbabilityEstimate {
                point_estimate: pct.to_probability(),
                range: None,
                method: ExtractionMethod::Percentage,
            })
    }
}

/// Matches a "0.XX" fraction following a trigger word
/// (probability, likelihood, chance, estimate).
#[derive(Debug, Default, Clone, Copy)]
pub struct DecimalMatcher;

impl ProbabilityMatcher for DecimalMatcher {
    fn name(&self) -> &'static str {
        "decimal"
    }

    fn find(&self, text: &str) -> Option<ProbabilityEstimate> {
        let caps = decimal_regex().captures(text)?;
        let value: f64 = caps.get(1)?.as_str().parse().ok()?;
        if value <= 0.0 || value >= 1.0 {
            return None;
        }
        Some(ProbabilityEstimate {
            point_estimate: Probability::new(value).ok()?,
            range: None,
            method: ExtractionMethod::Decimal,
        })
    }
}

/// Ordered chain of matchers, first hit wins
pub struct Extractor {
    matchers: Vec<Box<dyn ProbabilityMatcher>>,
}

impl Extractor {
    /// Build an extractor from a custom matcher chain
    #[must_use]
    pub fn with_matchers(matchers: Vec<Box<dyn ProbabilityMatcher>>) -> Self {
        Self { matchers }
    }

    /// Names of the configured matchers, in priority order
    pub fn matcher_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.matchers.iter().map(|m| m.name())
    }

    /// Run the chain over `text`
    #[must_use]
    pub fn extract(&self, text: &str) -> Option<ProbabilityEstimate> {
        self.matchers.iter().find_map(|matcher| {
            let estimate = matcher.find(text)?;
            tracing::debug!(
                matcher = matcher.name(),
                point_estimate = estimate.point_estimate.value(),
                "Probability extracted"
            );
            Some(estimate)
        })
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::with_matchers(vec![
            Box::new(RangeMatcher),
            Box::new(PercentageMatcher),
            Box::new(DecimalMatcher),
        ])
    }
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.matcher_names()).finish()
    }
}

/// Extract a probability estimate using the default matcher chain
#[must_use]
pub fn parse_probability_from_response(text: &str) -> Option<ProbabilityEstimate> {
    static DEFAULT: OnceLock<Extractor> = OnceLock::new();
    DEFAULT.get_or_init(Extractor::default).extract(text)
}
