//! Search Manager
//!
//! Owns one engine per mode and dispatches to the active one.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::search::{
    ExactSearchEngine, FuzzySearchEngine, RegexSearchEngine, SearchEngine, SearchMode,
    SearchResults, SearchStats,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchManagerStats {
    pub current_mode: SearchMode,
    pub case_sensitive: bool,
    pub engines: BTreeMap<SearchMode, SearchStats>,
}

#[derive(Debug)]
pub struct SearchManager {
    fuzzy: FuzzySearchEngine,
    exact: ExactSearchEngine,
    regex: RegexSearchEngine,
    current_mode: SearchMode,
    case_sensitive: bool,
}

impl SearchManager {
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            fuzzy: FuzzySearchEngine::new(case_sensitive),
            exact: ExactSearchEngine::new(case_sensitive),
            regex: RegexSearchEngine::new(case_sensitive),
            current_mode: SearchMode::default(),
            case_sensitive,
        }
    }

    fn engine(&self, mode: SearchMode) -> &dyn SearchEngine {
        match mode {
            SearchMode::Fuzzy => &self.fuzzy,
            SearchMode::Exact => &self.exact,
            SearchMode::Regex => &self.regex,
        }
    }

    fn engine_mut(&mut self, mode: SearchMode) -> &mut dyn SearchEngine {
        match mode {
            SearchMode::Fuzzy => &mut self.fuzzy,
            SearchMode::Exact => &mut self.exact,
            SearchMode::Regex => &mut self.regex,
        }
    }

    /// Searches with `mode`, or the active mode when `None`.
    pub fn search(
        &mut self,
        items: &[String],
        query: &str,
        mode: Option<SearchMode>,
        max_results: usize,
    ) -> SearchResults {
        let mode = mode.unwrap_or(self.current_mode);
        self.engine_mut(mode).search(items, query, max_results)
    }

    pub fn set_mode(&mut self, mode: SearchMode) {
        debug!("Search mode changed to {}", mode);
        self.current_mode = mode;
    }

    pub fn get_mode(&self) -> SearchMode {
        self.current_mode
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn clear_caches(&mut self) {
        for mode in SearchMode::ALL {
            self.engine_mut(mode).clear_cache();
        }
    }

    pub fn stats(&self) -> SearchManagerStats {
        SearchManagerStats {
            current_mode: self.current_mode,
            case_sensitive: self.case_sensitive,
            engines: SearchMode::ALL
                .into_iter()
                .map(|mode| (mode, self.engine(mode).stats()))
                .collect(),
        }
    }
}

impl Default for SearchManager {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_mode_is_fuzzy() {
        let mut manager = SearchManager::default();
        assert_eq!(manager.get_mode(), SearchMode::Fuzzy);

        let results = manager.search(&items(&["python", "javascript"]), "pyth", None, 10);
        assert_eq!(results.mode, SearchMode::Fuzzy);
        assert_eq!(results.results[0].item, "python");
    }

    #[test]
    fn test_explicit_mode_overrides_active() {
        let mut manager = SearchManager::default();
        let results = manager.search(
            &items(&["test.py", "test.js"]),
            r"\.py$",
            Some(SearchMode::Regex),
            10,
        );
        assert_eq!(results.mode, SearchMode::Regex);
        assert_eq!(results.items(), vec!["test.py"]);
        assert_eq!(manager.get_mode(), SearchMode::Fuzzy);
    }

    #[test]
    fn test_set_mode_switches_dispatch() {
        let mut manager = SearchManager::default();
        manager.set_mode(SearchMode::Exact);

        let results = manager.search(&items(&["python", "javascript"]), "pyth", None, 10);
        assert_eq!(results.mode, SearchMode::Exact);
        assert_eq!(results.items(), vec!["python"]);
    }

    #[test]
    fn test_stats_per_engine() {
        let mut manager = SearchManager::new(true);
        let list = items(&["go", "rust"]);
        manager.search(&list, "go", None, 10);
        manager.search(&list, "go", Some(SearchMode::Exact), 10);
        manager.search(&list, "go", Some(SearchMode::Exact), 10);

        let stats = manager.stats();
        assert!(stats.case_sensitive);
        assert_eq!(stats.current_mode, SearchMode::Fuzzy);
        assert_eq!(stats.engines[&SearchMode::Fuzzy].searches_performed, 1);
        assert_eq!(stats.engines[&SearchMode::Exact].searches_performed, 2);
        assert_eq!(stats.engines[&SearchMode::Regex].searches_performed, 0);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["current_mode"], "fuzzy");
        assert_eq!(json["engines"]["exact"]["total_items_processed"], 4);
    }

    #[test]
    fn test_clear_caches_keeps_results_stable() {
        let mut manager = SearchManager::default();
        let list = items(&["go", "rust"]);
        let before = manager.search(&list, "^r", Some(SearchMode::Regex), 10);
        manager.clear_caches();
        let after = manager.search(&list, "^r", Some(SearchMode::Regex), 10);
        assert_eq!(before.items(), after.items());
    }
}
