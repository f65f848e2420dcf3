//! Regular expression matching
//!
//! Compiled patterns are cached per (pattern, case sensitivity). A pattern
//! that fails to compile produces an empty result set.

use std::collections::HashMap;

use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::search::{
    run_search, sort_results, MatchSpan, SearchCounters, SearchEngine, SearchMode, SearchResult,
    SearchResults, SearchStats,
};

#[derive(Debug, Default)]
pub struct RegexSearchEngine {
    case_sensitive: bool,
    counters: SearchCounters,
    compiled: HashMap<(String, bool), Regex>,
}

impl RegexSearchEngine {
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            case_sensitive,
            ..Self::default()
        }
    }

    /// Number of compiled patterns held.
    pub fn cached_patterns(&self) -> usize {
        self.compiled.len()
    }

    fn compile(&mut self, pattern: &str) -> Option<Regex> {
        let key = (pattern.to_string(), self.case_sensitive);
        if let Some(regex) = self.compiled.get(&key) {
            return Some(regex.clone());
        }

        match RegexBuilder::new(pattern)
            .case_insensitive(!self.case_sensitive)
            .build()
        {
            Ok(regex) => {
                self.compiled.insert(key, regex.clone());
                Some(regex)
            }
            Err(e) => {
                warn!("Invalid regex pattern '{}': {}", pattern, e);
                None
            }
        }
    }
}

/// Converts a byte range of `text` into a character range.
fn char_span(text: &str, start: usize, end: usize) -> MatchSpan {
    let char_start = text[..start].chars().count();
    (char_start, char_start + text[start..end].chars().count())
}

impl SearchEngine for RegexSearchEngine {
    fn mode(&self) -> SearchMode {
        SearchMode::Regex
    }

    fn search(&mut self, items: &[String], query: &str, max_results: usize) -> SearchResults {
        // Compile outside the timed closure so a bad pattern still counts as a search.
        let regex = if query.trim().is_empty() {
            None
        } else {
            self.compile(query)
        };

        run_search(
            SearchMode::Regex,
            &mut self.counters,
            items,
            query,
            max_results,
            || {
                let Some(regex) = regex else {
                    return Vec::new();
                };
                let mut results = Vec::new();

                for item in items {
                    if results.len() >= max_results {
                        break;
                    }
                    let match_positions: Vec<MatchSpan> = regex
                        .find_iter(item)
                        .map(|m| char_span(item, m.start(), m.end()))
                        .collect();
                    if match_positions.is_empty() {
                        continue;
                    }

                    let item_len = item.chars().count();
                    let matched: usize = match_positions.iter().map(|(s, e)| e - s).sum();
                    let score = if item_len == 0 {
                        0.0
                    } else {
                        matched as f64 / item_len as f64
                    };
                    results.push(SearchResult {
                        item: item.clone(),
                        score,
                        match_positions,
                        mode: SearchMode::Regex,
                    });
                }

                sort_results(&mut results);
                results
            },
        )
    }

    fn stats(&self) -> SearchStats {
        self.counters.report()
    }

    fn clear_cache(&mut self) {
        self.compiled.clear();
    }
}
