// src/thread.rs
//! Discussion-thread parsing: film title from the thread title, source links
//! from the body.
//!
//! The thread format is written by humans and drifts; everything that knows
//! about it lives behind [`ThreadFormat`], so a new layout only needs a new
//! implementation here.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Candidate thread as delivered by the discovery feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscussionThread {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
}

/// Body label of the tomato meter link.
pub const ROTTEN_TOMATOES_LABEL: &str = "Rotten Tomatoes";
/// Body label of the Metacritic link.
pub const METACRITIC_LABEL: &str = "Metacritic";

/// Stable parsing interface over the thread text format.
pub trait ThreadFormat: Send + Sync {
    /// Film title if the thread is an official discussion, else `None`.
    fn film_title(&self, thread_title: &str) -> Option<String>;
    /// Link attached to `label` in the score section of the body.
    fn source_url(&self, body: &str, label: &str) -> Option<String>;
}

/// The "Official Discussion: <Title> [SPOILERS]" layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfficialDiscussion;

static RE_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Official Discussion(?::\s+|\s+-\s+)([^(]*).*[\[({]SPOILERS[\])}]")
        .expect("title regex")
});

impl ThreadFormat for OfficialDiscussion {
    fn film_title(&self, thread_title: &str) -> Option<String> {
        let caps = RE_TITLE.captures(thread_title.trim())?;
        let title = caps.get(1)?.as_str().trim();
        if title.is_empty() {
            None
        } else {
            Some(title.to_string())
        }
    }

    fn source_url(&self, body: &str, label: &str) -> Option<String> {
        // Score links live in the last `---` section.
        let section = body.rsplit("---").next().unwrap_or_default();
        let re = link_regex(label)?;
        section.lines().find_map(|line| {
            let line = html_escape::decode_html_entities(line);
            re.captures(line.trim())
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        })
    }
}

fn link_regex(label: &str) -> Option<Regex> {
    let label = regex::escape(label).replace(' ', r"\s+");
    let pat = format!(r"^\*\*{label}:\*\*\s+\[[0-9]{{1,3}}(?:%|/100)\]\((\S+?)\)\s*$");
    match Regex::new(&pat) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(target: "thread", error = %e, label, "bad link label");
            None
        }
    }
}

/// Drop the query string (from the first `?`) of a URL returned by a lookup.
pub fn strip_query(url: &str) -> &str {
    match url.find('?') {
        Some(i) => &url[..i],
        None => url,
    }
}
