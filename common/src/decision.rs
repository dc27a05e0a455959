//! Binary decision rule applied to the classifier output.
//!
use std::fmt;

use serde::{Deserialize, Serialize};

/// Probabilities below this value are classified as biodegradable.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Class assigned to an uploaded image.
#[derive(Debug, Clone, Copy, Deserialize, Eq, PartialEq, Serialize)]
pub enum Label {
    #[serde(rename = "Biodegradable")]
    Biodegradable,
    #[serde(rename = "Non-Biodegradable")]
    NonBiodegradable,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Biodegradable => "Biodegradable",
            Label::NonBiodegradable => "Non-Biodegradable",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label together with the confidence in percent, rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub label: Label,
    pub confidence: f64,
    pub probability: f64,
}

impl Prediction {
    /// Decide on a label for the probability `p` of the non-biodegradable class.
    ///
    /// The boundary is inclusive on the high side: `p == 0.5` is non-biodegradable. The
    /// confidence is the probability mass on the winning side, so it always lies in
    /// `[50.0, 100.0]`.
    pub fn from_probability(p: f64) -> Self {
        let (label, winning) = if p < DECISION_THRESHOLD {
            (Label::Biodegradable, 1.0 - p)
        } else {
            (Label::NonBiodegradable, p)
        };

        Self {
            label,
            confidence: round_to_hundredths(100.0 * winning),
            probability: p,
        }
    }

    /// Confidence with two decimals and a percent sign, e.g. `90.00%`.
    pub fn confidence_text(&self) -> String {
        format!("{:.2}%", self.confidence)
    }
}

/// Logistic function mapping any real value into `(0, 1)`.
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
