// src/scores/normalize.rs
//! Raw → canonical 0–10 mapping. Deterministic, no I/O.

use super::{Grade, RawScoreRecord, RawValue, Reading, SourceId};

/// Canonical value of one source, `None` when the source had nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedScore {
    pub source: SourceId,
    pub value: Option<f64>,
}

/// Letter grades mapped the way Metacritic's scoring guide reads them.
pub fn grade_to_canonical(g: Grade) -> f64 {
    match g {
        Grade::APlus | Grade::A => 10.0,
        Grade::AMinus => 9.1,
        Grade::BPlus => 8.3,
        Grade::B => 7.5,
        Grade::BMinus => 6.7,
        Grade::CPlus => 5.8,
        Grade::C => 5.0,
        Grade::CMinus => 4.2,
        Grade::DPlus => 3.3,
        Grade::D => 2.5,
        Grade::DMinus => 1.6,
        Grade::FPlus => 0.8,
        Grade::F | Grade::FMinus => 0.0,
    }
}

/// Convert a native figure to the 0–10 scale.
pub fn to_canonical(v: RawValue) -> f64 {
    let x = match v {
        RawValue::HundredPoint(x) => x / 10.0,
        RawValue::TenPoint(x) => x,
        RawValue::FivePoint(x) => x * 2.0,
        RawValue::Letter(g) => grade_to_canonical(g),
    };
    x.clamp(0.0, 10.0)
}

pub fn normalize(rec: &RawScoreRecord) -> NormalizedScore {
    let value = match rec.value {
        Reading::Available(v) if v_is_finite(v) => Some(to_canonical(v)),
        _ => None,
    };
    NormalizedScore {
        source: rec.source,
        value,
    }
}

// A NaN scraped from a page is no reading at all.
fn v_is_finite(v: RawValue) -> bool {
    match v {
        RawValue::HundredPoint(x) | RawValue::TenPoint(x) | RawValue::FivePoint(x) => {
            x.is_finite()
        }
        RawValue::Letter(_) => true,
    }
}
