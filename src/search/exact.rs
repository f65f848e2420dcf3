//! Exact substring matching

use crate::search::{
    find_chars, fold_chars, run_search, sort_results, MatchSpan, SearchCounters, SearchEngine,
    SearchMode, SearchResult, SearchResults, SearchStats,
};

#[derive(Debug, Default)]
pub struct ExactSearchEngine {
    case_sensitive: bool,
    counters: SearchCounters,
}

impl ExactSearchEngine {
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            case_sensitive,
            counters: SearchCounters::default(),
        }
    }
}

/// Every occurrence of `query` in `text`, overlapping ones included.
fn occurrences(query: &[char], text: &[char]) -> Vec<MatchSpan> {
    let mut positions = Vec::new();
    let mut from = 0;
    while let Some(start) = find_chars(text, query, from) {
        positions.push((start, start + query.len()));
        from = start + 1;
    }
    positions
}

impl SearchEngine for ExactSearchEngine {
    fn mode(&self) -> SearchMode {
        SearchMode::Exact
    }

    fn search(&mut self, items: &[String], query: &str, max_results: usize) -> SearchResults {
        let case_sensitive = self.case_sensitive;
        run_search(
            SearchMode::Exact,
            &mut self.counters,
            items,
            query,
            max_results,
            || {
                let query = fold_chars(query, case_sensitive);
                let mut results = Vec::new();

                for item in items {
                    if results.len() >= max_results {
                        break;
                    }
                    let text = fold_chars(item, case_sensitive);
                    let match_positions = occurrences(&query, &text);
                    if match_positions.is_empty() {
                        continue;
                    }
                    let score = if text == query {
                        1.0
                    } else {
                        query.len() as f64 / text.len() as f64
                    };
                    results.push(SearchResult {
                        item: item.clone(),
                        score,
                        match_positions,
                        mode: SearchMode::Exact,
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
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_identical_scores_one_and_substring_scores_ratio() {
        let mut engine = ExactSearchEngine::default();
        let results = engine.search(&items(&["PythonAnywhere", "Python"]), "python", 100);

        assert_eq!(results.items(), vec!["Python", "PythonAnywhere"]);
        assert_eq!(results.results[0].score, 1.0);
        assert!((results.results[1].score - 6.0 / 14.0).abs() < 1e-9);
        assert_eq!(results.results[1].match_positions, vec![(0, 6)]);
    }

    #[test]
    fn test_overlapping_occurrences_recorded() {
        let mut engine = ExactSearchEngine::default();
        let results = engine.search(&items(&["aaaa"]), "aa", 10);
        assert_eq!(
            results.results[0].match_positions,
            vec![(0, 2), (1, 3), (2, 4)]
        );
    }

    #[test]
    fn test_non_matching_items_excluded() {
        let mut engine = ExactSearchEngine::default();
        let results = engine.search(&items(&["rust", "go", "gradle"]), "go", 10);
        assert_eq!(results.items(), vec!["go"]);
    }

    #[test]
    fn test_stops_at_max_results_in_input_order() {
        let mut engine = ExactSearchEngine::default();
        // "node" would score higher but is never reached
        let results = engine.search(&items(&["nodejs", "node_modules", "node"]), "node", 2);
        assert_eq!(results.items(), vec!["nodejs", "node_modules"]);

        assert!(engine.search(&items(&["node"]), "node", 0).is_empty());
    }

    #[test]
    fn test_case_sensitive_mode() {
        let mut engine = ExactSearchEngine::new(true);
        assert!(engine.search(&items(&["Python"]), "python", 10).is_empty());
        assert_eq!(engine.search(&items(&["Python"]), "Py", 10).len(), 1);
    }

    #[test]
    fn test_positions_count_characters() {
        let mut engine = ExactSearchEngine::default();
        let results = engine.search(&items(&["Über-go"]), "go", 10);
        assert_eq!(results.results[0].match_positions, vec![(5, 7)]);
        assert!((results.results[0].score - 2.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_blank_query_and_stats() {
        let mut engine = ExactSearchEngine::default();
        let results = engine.search(&items(&["a", "b"]), "", 10);
        assert_eq!(results.items(), vec!["a", "b"]);
        assert_eq!(results.mode, SearchMode::Exact);
        assert_eq!(engine.stats().searches_performed, 1);
    }
}
