//! # Consensus
//! Maps a (critic mean, audience mean) pair to a discrete verdict.
//!
//! Policy: the gap `|critic - audience|` is compared against a threshold
//! triple. When both means sit on the same side of the "generally
//! favorable" line (6.0) the triple is (1.0, 1.5, 2.2); when they straddle
//! it the triple tightens to (1.0, 1.3, 2.0). Pure, no I/O.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical value separating favorable from unfavorable reception.
pub const BALLPARK_BOUNDARY: f64 = 6.0;

/// Thresholds when both means land on the same side of the boundary.
pub const IN_BALLPARK: Thresholds = Thresholds {
    agree: 1.0,
    slight: 1.5,
    somewhat: 2.2,
};

/// Thresholds when the means straddle the boundary.
pub const CROSS_BOUNDARY: Thresholds = Thresholds {
    agree: 1.0,
    slight: 1.3,
    somewhat: 2.0,
};

// Means are one-decimal values; gaps like 8.3 - 6.8 must not overshoot 1.5.
const GAP_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Agree,
    SlightDisagree,
    SomewhatDisagree,
    Disagree,
    Unknown,
}

impl Verdict {
    /// Closing phrase of the summary sentence, `None` for `Unknown`.
    pub fn phrase(self) -> Option<&'static str> {
        match self {
            Verdict::Agree => Some("Critics and audiences agree."),
            Verdict::SlightDisagree => Some("Critics and audiences slightly disagree."),
            Verdict::SomewhatDisagree => Some("Critics and audiences somewhat disagree."),
            Verdict::Disagree => Some("Critics and audiences definitely disagree."),
            Verdict::Unknown => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Agree => "agree",
            Verdict::SlightDisagree => "slight_disagree",
            Verdict::SomewhatDisagree => "somewhat_disagree",
            Verdict::Disagree => "disagree",
            Verdict::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub agree: f64,
    pub slight: f64,
    pub somewhat: f64,
}

impl Thresholds {
    fn classify_gap(&self, d: f64) -> Verdict {
        if d <= self.agree + GAP_TOLERANCE {
            Verdict::Agree
        } else if d <= self.slight + GAP_TOLERANCE {
            Verdict::SlightDisagree
        } else if d <= self.somewhat + GAP_TOLERANCE {
            Verdict::SomewhatDisagree
        } else {
            Verdict::Disagree
        }
    }
}

/// Both favorable or both unfavorable.
pub fn in_ballpark(critic: f64, audience: f64) -> bool {
    (critic >= BALLPARK_BOUNDARY) == (audience >= BALLPARK_BOUNDARY)
}

pub fn thresholds_for(critic: f64, audience: f64) -> Thresholds {
    if in_ballpark(critic, audience) {
        IN_BALLPARK
    } else {
        CROSS_BOUNDARY
    }
}

/// Classify the critic/audience gap. Either side missing → `Unknown`.
pub fn classify(critic: Option<f64>, audience: Option<f64>) -> Verdict {
    let (Some(c), Some(a)) = (critic, audience) else {
        return Verdict::Unknown;
    };
    if !c.is_finite() || !a.is_finite() {
        return Verdict::Unknown;
    }
    thresholds_for(c, a).classify_gap((c - a).abs())
}
