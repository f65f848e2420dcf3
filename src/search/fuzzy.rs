//! Fuzzy matching
//!
//! Full match scores 1.0, substring 0.9, otherwise an in-order subsequence
//! walk scored by coverage, length similarity and a start-of-string bonus.

use crate::search::{
    find_chars, fold_chars, run_search, sort_results, MatchSpan, SearchCounters, SearchEngine,
    SearchMode, SearchResult, SearchResults, SearchStats,
};

const SUBSTRING_SCORE: f64 = 0.9;
const SUBSEQUENCE_WEIGHT: f64 = 0.8;
const START_BONUS: f64 = 1.2;

#[derive(Debug, Default)]
pub struct FuzzySearchEngine {
    case_sensitive: bool,
    counters: SearchCounters,
}

impl FuzzySearchEngine {
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            case_sensitive,
            counters: SearchCounters::default(),
        }
    }
}

/// Scores `text` against `query`; `None` when nothing matches.
fn fuzzy_match(query: &[char], text: &[char]) -> Option<(f64, Vec<MatchSpan>)> {
    if query.is_empty() {
        return Some((1.0, Vec::new()));
    }
    if text.is_empty() {
        return None;
    }
    if query == text {
        return Some((1.0, vec![(0, text.len())]));
    }
    if let Some(start) = find_chars(text, query, 0) {
        return Some((SUBSTRING_SCORE, vec![(start, start + query.len())]));
    }

    // Greedy single pass: consume query characters in order wherever they occur.
    let mut positions = Vec::new();
    let mut next = 0usize;
    for (idx, c) in text.iter().enumerate() {
        if next < query.len() && *c == query[next] {
            positions.push((idx, idx + 1));
            next += 1;
        }
    }
    if positions.is_empty() {
        return None;
    }

    let match_ratio = positions.len() as f64 / query.len() as f64;
    let longest = text.len().max(query.len()) as f64;
    let length_penalty = 1.0 - text.len().abs_diff(query.len()) as f64 / longest;
    let start_bonus = if positions[0].0 == 0 { START_BONUS } else { 1.0 };

    let score = match_ratio * length_penalty * start_bonus * SUBSEQUENCE_WEIGHT;
    Some((score.min(1.0), positions))
}

impl SearchEngine for FuzzySearchEngine {
    fn mode(&self) -> SearchMode {
        SearchMode::Fuzzy
    }

    fn search(&mut self, items: &[String], query: &str, max_results: usize) -> SearchResults {
        let case_sensitive = self.case_sensitive;
        run_search(
            SearchMode::Fuzzy,
            &mut self.counters,
            items,
            query,
            max_results,
            || {
                let query = fold_chars(query, case_sensitive);
                let mut results: Vec<SearchResult> = items
                    .iter()
                    .filter_map(|item| {
                        let (score, match_positions) =
                            fuzzy_match(&query, &fold_chars(item, case_sensitive))?;
                        (score > 0.0).then(|| SearchResult {
                            item: item.clone(),
                            score,
                            match_positions,
                            mode: SearchMode::Fuzzy,
                        })
                    })
                    .collect();

                sort_results(&mut results);
                results.truncate(max_results);
                results
            },
        )
    }

    fn stats(&self) -> SearchStats {
        self.counters.report()
    }
}
