//! Search Module
//!
//! Three interchangeable matching strategies over a list of template names,
//! each producing scored, position-annotated results, plus the manager that
//! holds the active strategy.
//!
//! Positions and lengths are measured in characters, not bytes.

mod exact;
mod fuzzy;
mod manager;
mod pattern;


use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use serde::Serialize;
use tracing::debug;

pub use exact::ExactSearchEngine;
pub use fuzzy::FuzzySearchEngine;
pub use manager::{SearchManager, SearchManagerStats};
pub use pattern::RegexSearchEngine;

// == Search Mode ==
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Fuzzy,
    Exact,
    Regex,
}

impl SearchMode {
    pub const ALL: [SearchMode; 3] = [SearchMode::Fuzzy, SearchMode::Exact, SearchMode::Regex];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Fuzzy => "fuzzy",
            SearchMode::Exact => "exact",
            SearchMode::Regex => "regex",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fuzzy" => Ok(SearchMode::Fuzzy),
            "exact" => Ok(SearchMode::Exact),
            "regex" => Ok(SearchMode::Regex),
            other => Err(format!("unknown search mode: {other}")),
        }
    }
}

// == Results ==
/// Half-open `(start, end)` character range into the matched item.
pub type MatchSpan = (usize, usize);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub item: String,
    /// Relevance in `[0, 1]`
    pub score: f64,
    pub match_positions: Vec<MatchSpan>,
    pub mode: SearchMode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    /// Already ordered best first
    pub results: Vec<SearchResult>,
    pub query: String,
    pub mode: SearchMode,
    /// Seconds spent searching
    pub search_time: f64,
    pub total_items: usize,
}

impl SearchResults {
    /// Matched items, in result order.
    pub fn items(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.item.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

// == Statistics ==
/// Running counters kept by each engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchCounters {
    pub searches_performed: u64,
    /// Seconds
    pub total_search_time: f64,
    pub items_processed: u64,
}

impl SearchCounters {
    pub fn record(&mut self, search_time: f64, items: usize) {
        self.searches_performed += 1;
        self.total_search_time += search_time;
        self.items_processed += items as u64;
    }

    pub fn report(&self) -> SearchStats {
        SearchStats {
            searches_performed: self.searches_performed,
            avg_search_time: self.total_search_time / self.searches_performed.max(1) as f64,
            total_items_processed: self.items_processed,
        }
    }
}

/// Diagnostics snapshot of one engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchStats {
    pub searches_performed: u64,
    /// Seconds
    pub avg_search_time: f64,
    pub total_items_processed: u64,
}

// == Engine Trait ==
/// Common capability of the matching strategies.
pub trait SearchEngine {
    fn mode(&self) -> SearchMode;

    /// Matches `query` against `items`, returning at most `max_results`.
    ///
    /// A blank query returns the first `max_results` items unfiltered, each
    /// scored 1.0.
    fn search(&mut self, items: &[String], query: &str, max_results: usize) -> SearchResults;

    fn stats(&self) -> SearchStats;

    /// Drops derived caches such as compiled patterns.
    fn clear_cache(&mut self) {}
}

// == Shared Helpers ==
/// Times a search, handles the blank-query pass-through and updates counters.
fn run_search(
    mode: SearchMode,
    counters: &mut SearchCounters,
    items: &[String],
    query: &str,
    max_results: usize,
    matcher: impl FnOnce() -> Vec<SearchResult>,
) -> SearchResults {
    let start = Instant::now();

    let results = if query.trim().is_empty() {
        items
            .iter()
            .take(max_results)
            .map(|item| SearchResult {
                item: item.clone(),
                score: 1.0,
                match_positions: Vec::new(),
                mode,
            })
            .collect()
    } else {
        matcher()
    };

    let search_time = start.elapsed().as_secs_f64();
    counters.record(search_time, items.len());
    debug!(
        "{} search for '{}' found {} matches in {:.3}s",
        mode,
        query,
        results.len(),
        search_time
    );

    SearchResults {
        results,
        query: query.to_string(),
        mode,
        search_time,
        total_items: items.len(),
    }
}

/// Best score first, ties in case-insensitive item order.
fn sort_results(results: &mut [SearchResult]) {
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.item.to_lowercase().cmp(&b.item.to_lowercase()))
    });
}

/// Splits into characters, lowercasing each one unless case-sensitive.
///
/// Folding is per character so indices line up with the original item.
fn fold_chars(text: &str, case_sensitive: bool) -> Vec<char> {
    text.chars()
        .map(|c| {
            if case_sensitive {
                c
            } else {
                c.to_lowercase().next().unwrap_or(c)
            }
        })
        .collect()
}

/// Index of the first occurrence of `needle` in `haystack` at or after `from`.
fn find_chars(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    (from..=haystack.len() - needle.len()).find(|&i| haystack[i..i + needle.len()] == *needle)
}
