// src/scores/mod.rs
//! Score model shared by collection, normalization and aggregation.
//!
//! Every source field is a [`Reading`]: either a value on the source's native
//! scale or an explicit `Unavailable`. A legitimate zero is `Available(0.0)`,
//! never confused with "not found".

pub mod aggregate;
pub mod normalize;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use aggregate::{aggregate, AggregateResult};
pub use normalize::{normalize, NormalizedScore};

/// Which side of the reception a source speaks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreKind {
    Critic,
    Audience,
}

/// Native scale of the figure a source publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NativeScale {
    Percent,
    HundredPoint,
    TenPoint,
    FivePoint,
    LetterGrade,
}

impl NativeScale {
    /// Suffix shown after a value in the reply text.
    pub fn suffix(self) -> &'static str {
        match self {
            NativeScale::Percent => "%",
            NativeScale::HundredPoint => "/100",
            NativeScale::TenPoint => "/10",
            NativeScale::FivePoint => "/5",
            NativeScale::LetterGrade => "",
        }
    }
}

/// The configured sources, in reply order (critics first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    Metacritic,
    RottenTomatoes,
    MetacriticUsers,
    RottenTomatoesAudience,
    ImdbUsers,
    CinemaScore,
}

impl SourceId {
    pub const CRITICS: [SourceId; 2] = [SourceId::Metacritic, SourceId::RottenTomatoes];
    pub const AUDIENCES: [SourceId; 4] = [
        SourceId::MetacriticUsers,
        SourceId::RottenTomatoesAudience,
        SourceId::ImdbUsers,
        SourceId::CinemaScore,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SourceId::Metacritic => "Metacritic",
            SourceId::RottenTomatoes => "Rotten Tomatoes",
            SourceId::MetacriticUsers => "Metacritic Users",
            SourceId::RottenTomatoesAudience => "Rotten Tomatoes Audience",
            SourceId::ImdbUsers => "IMDB Users",
            SourceId::CinemaScore => "Cinemascore",
        }
    }

    pub fn kind(self) -> ScoreKind {
        match self {
            SourceId::Metacritic | SourceId::RottenTomatoes => ScoreKind::Critic,
            _ => ScoreKind::Audience,
        }
    }

    /// Scale of the headline figure shown first in the reply.
    pub fn headline_scale(self) -> NativeScale {
        match self {
            SourceId::Metacritic => NativeScale::HundredPoint,
            SourceId::RottenTomatoes | SourceId::RottenTomatoesAudience => NativeScale::Percent,
            SourceId::MetacriticUsers | SourceId::ImdbUsers => NativeScale::TenPoint,
            SourceId::CinemaScore => NativeScale::LetterGrade,
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value that was either found on its source or explicitly not.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "value")]
pub enum Reading<T> {
    Available(T),
    Unavailable,
}

impl<T> Default for Reading<T> {
    fn default() -> Self {
        Reading::Unavailable
    }
}

impl<T> Reading<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Reading::Available(_))
    }

    pub fn as_ref(&self) -> Reading<&T> {
        match self {
            Reading::Available(v) => Reading::Available(v),
            Reading::Unavailable => Reading::Unavailable,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reading<U> {
        match self {
            Reading::Available(v) => Reading::Available(f(v)),
            Reading::Unavailable => Reading::Unavailable,
        }
    }

    pub fn available(self) -> Option<T> {
        match self {
            Reading::Available(v) => Some(v),
            Reading::Unavailable => None,
        }
    }
}

impl<T> From<Option<T>> for Reading<T> {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => Reading::Available(v),
            None => Reading::Unavailable,
        }
    }
}

/// Letter grade of the exit-poll panel (A+ through F-).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Grade {
    APlus,
    A,
    AMinus,
    BPlus,
    B,
    BMinus,
    CPlus,
    C,
    CMinus,
    DPlus,
    D,
    DMinus,
    FPlus,
    F,
    FMinus,
}

impl Grade {
    pub fn as_str(self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::AMinus => "A-",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::BMinus => "B-",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::CMinus => "C-",
            Grade::DPlus => "D+",
            Grade::D => "D",
            Grade::DMinus => "D-",
            Grade::FPlus => "F+",
            Grade::F => "F",
            Grade::FMinus => "F-",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown letter grade: {0:?}")]
pub struct UnknownGrade(pub String);

impl FromStr for Grade {
    type Err = UnknownGrade;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let g = match s.trim().to_ascii_uppercase().as_str() {
            "A+" => Grade::APlus,
            "A" => Grade::A,
            "A-" => Grade::AMinus,
            "B+" => Grade::BPlus,
            "B" => Grade::B,
            "B-" => Grade::BMinus,
            "C+" => Grade::CPlus,
            "C" => Grade::C,
            "C-" => Grade::CMinus,
            "D+" => Grade::DPlus,
            "D" => Grade::D,
            "D-" => Grade::DMinus,
            "F+" => Grade::FPlus,
            "F" => Grade::F,
            "F-" => Grade::FMinus,
            _ => return Err(UnknownGrade(s.to_string())),
        };
        Ok(g)
    }
}

impl TryFrom<String> for Grade {
    type Error = UnknownGrade;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Grade> for String {
    fn from(g: Grade) -> Self {
        g.as_str().to_string()
    }
}

/// One critic tier of the tomato meter: share of positive reviews plus the
/// average rating out of 10.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticTier {
    pub liked_pct: u8,
    pub avg_rating: f64,
}

/// The audience tier: share who liked it plus the average rating out of 5.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudienceTier {
    pub liked_pct: u8,
    pub avg_rating: f64,
}

/// Tomato meter critic data. The top-critics subset only exists when the
/// all-critics tier was found.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TomatoCritics {
    pub all: CriticTier,
    pub top: Reading<CriticTier>,
}

/// Everything collected for one film.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreSheet {
    pub metacritic: Reading<f64>,
    pub rotten_tomatoes: Reading<TomatoCritics>,
    pub metacritic_users: Reading<f64>,
    pub rotten_tomatoes_audience: Reading<AudienceTier>,
    pub imdb_users: Reading<f64>,
    pub cinemascore: Reading<Grade>,
}

/// Raw figure on its native scale, as fed into normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawValue {
    HundredPoint(f64),
    TenPoint(f64),
    FivePoint(f64),
    Letter(Grade),
}

/// One aggregatable figure per source. Percent figures never appear here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawScoreRecord {
    pub source: SourceId,
    pub value: Reading<RawValue>,
}

impl ScoreSheet {
    /// The aggregatable figure of every source, in reply order.
    pub fn records(&self) -> Vec<RawScoreRecord> {
        let rec = |source, value| RawScoreRecord { source, value };
        vec![
            rec(SourceId::Metacritic, self.metacritic.map(RawValue::HundredPoint)),
            rec(
                SourceId::RottenTomatoes,
                self.rotten_tomatoes
                    .map(|rt| RawValue::TenPoint(rt.all.avg_rating)),
            ),
            rec(SourceId::MetacriticUsers, self.metacritic_users.map(RawValue::TenPoint)),
            rec(
                SourceId::RottenTomatoesAudience,
                self.rotten_tomatoes_audience
                    .map(|a| RawValue::FivePoint(a.avg_rating)),
            ),
            rec(SourceId::ImdbUsers, self.imdb_users.map(RawValue::TenPoint)),
            rec(SourceId::CinemaScore, self.cinemascore.map(RawValue::Letter)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_parses_case_insensitively_and_rejects_garbage() {
        assert_eq!("b+".parse::<Grade>().unwrap(), Grade::BPlus);
        assert_eq!(" A- ".parse::<Grade>().unwrap(), Grade::AMinus);
        assert!("E".parse::<Grade>().is_err());
        assert!("".parse::<Grade>().is_err());
    }

    #[test]
    fn reading_keeps_zero_distinct_from_unavailable() {
        let zero: Reading<f64> = Some(0.0).into();
        assert_eq!(zero, Reading::Available(0.0));
        let none: Reading<f64> = None.into();
        assert!(!none.is_available());
    }

    #[test]
    fn records_follow_reply_order_and_skip_percent_figures() {
        let sheet = ScoreSheet {
            rotten_tomatoes: Reading::Available(TomatoCritics {
                all: CriticTier {
                    liked_pct: 91,
                    avg_rating: 7.8,
                },
                top: Reading::Unavailable,
            }),
            ..Default::default()
        };
        let recs = sheet.records();
        let order: Vec<_> = recs.iter().map(|r| r.source).collect();
        assert_eq!(
            order,
            [SourceId::CRITICS.as_slice(), SourceId::AUDIENCES.as_slice()].concat()
        );
        assert_eq!(recs[1].value, Reading::Available(RawValue::TenPoint(7.8)));
    }

    #[test]
    fn reading_serializes_with_explicit_status() {
        let v = serde_json::to_value(Reading::Available(7.5)).unwrap();
        assert_eq!(v, serde_json::json!({"status": "available", "value": 7.5}));
        let u: Reading<f64> = serde_json::from_str(r#"{"status":"unavailable"}"#).unwrap();
        assert_eq!(u, Reading::Unavailable);
    }
}
