// src/render.rs
//! Reply text: Critics block, Audiences block, summary sentence.

use chrono::{DateTime, Utc};
use std::fmt::Write as _;

use crate::consensus::Verdict;
use crate::scores::{AggregateResult, NativeScale, Reading, ScoreSheet, SourceId};

pub const NOT_AVAILABLE: &str = "Not Available";

/// Everything the reply is built from.
#[derive(Debug, Clone)]
pub struct ReplyInput<'a> {
    pub title: &'a str,
    pub sheet: &'a ScoreSheet,
    pub aggregate: &'a AggregateResult,
    pub verdict: Verdict,
    pub as_of: DateTime<Utc>,
}

pub fn render_reply(input: &ReplyInput<'_>) -> String {
    let mut out = format!(
        "Critic/Audience scores for *{}* as of {}:\n\n",
        input.title,
        input.as_of.format("%m/%d/%Y, %I:%M %p UTC")
    );
    out.push_str(&source_block("Critics", &SourceId::CRITICS, input.sheet));
    out.push('\n');
    out.push_str(&source_block("Audiences", &SourceId::AUDIENCES, input.sheet));
    if let Some(summary) = summary(input.aggregate, input.verdict) {
        out.push('\n');
        out.push_str(&summary);
    }
    out
}

/// `None` when either mean is missing.
pub fn summary(agg: &AggregateResult, verdict: Verdict) -> Option<String> {
    let (critic, audience) = (agg.critic?, agg.audience?);
    let phrase = verdict.phrase()?;
    Some(format!(
        "The average critic score is {critic:.1}/10. The average audience score is {audience:.1}/10. {phrase}"
    ))
}

fn source_block(heading: &str, sources: &[SourceId], sheet: &ScoreSheet) -> String {
    let mut block = format!("**{heading}**  \n\n");
    for &src in sources {
        let value = source_line(src, sheet).unwrap_or_else(|| NOT_AVAILABLE.to_string());
        let _ = write!(block, "* {}: {}  \n\n", src.name(), value);
    }
    block
}

fn source_line(src: SourceId, sheet: &ScoreSheet) -> Option<String> {
    let scale = src.headline_scale().suffix();
    match src {
        SourceId::Metacritic => sheet
            .metacritic
            .available()
            .map(|v| format!("{v:.0}{scale}")),
        SourceId::RottenTomatoes => sheet.rotten_tomatoes.available().map(|rt| {
            let mut s = format!(
                "{}{scale} liked it, average rating {:.1}{}",
                rt.all.liked_pct,
                rt.all.avg_rating,
                NativeScale::TenPoint.suffix()
            );
            if let Reading::Available(top) = rt.top {
                let _ = write!(
                    s,
                    " (Top Critics: {}%, average rating {:.1}/10)",
                    top.liked_pct, top.avg_rating
                );
            }
            s
        }),
        SourceId::MetacriticUsers => sheet
            .metacritic_users
            .available()
            .map(|v| format!("{v:.1}{scale}")),
        SourceId::RottenTomatoesAudience => sheet.rotten_tomatoes_audience.available().map(|a| {
            format!(
                "{}{scale} liked it, average rating {:.1}{}",
                a.liked_pct,
                a.avg_rating,
                NativeScale::FivePoint.suffix()
            )
        }),
        SourceId::ImdbUsers => sheet.imdb_users.available().map(|v| format!("{v:.1}{scale}")),
        SourceId::CinemaScore => sheet.cinemascore.available().map(|g| g.to_string()),
    }
}
