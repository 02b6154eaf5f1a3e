//! Multi-field relevance ranking over a cache snapshot.
//!
//! Every comparison is case-insensitive substring containment. A tab must
//! satisfy every field that is set; each satisfied field adds to its score.

use serde::{Deserialize, Serialize};
use tabrelay_core::Tab;

pub const DEFAULT_LIMIT: usize = 10;

const DOMAIN_WEIGHT: f64 = 2.0;
const TITLE_FILTER_WEIGHT: f64 = 1.5;
const URL_FILTER_WEIGHT: f64 = 1.0;
const QUERY_TITLE_WEIGHT: f64 = 1.0;
const QUERY_URL_WEIGHT: f64 = 0.5;
const EXACT_TITLE_BONUS: f64 = 2.0;
const TITLE_PREFIX_BONUS: f64 = 1.0;
const UNFILTERED_SCORE: f64 = 0.1;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    /// Free text matched against title and URL.
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Non-positive or absent means `DEFAULT_LIMIT`.
    #[serde(default)]
    pub limit: Option<i64>,
}

impl SearchQuery {
    pub fn query(mut self, q: &str) -> Self {
        self.query = Some(q.to_string());
        self
    }

    pub fn domain(mut self, d: &str) -> Self {
        self.domain = Some(d.to_string());
        self
    }

    pub fn title(mut self, t: &str) -> Self {
        self.title = Some(t.to_string());
        self
    }

    pub fn url(mut self, u: &str) -> Self {
        self.url = Some(u.to_string());
        self
    }

    pub fn limit(mut self, n: i64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn effective_limit(&self) -> usize {
        match self.limit {
            Some(n) if n > 0 => n as usize,
            _ => DEFAULT_LIMIT,
        }
    }

    pub fn is_unfiltered(&self) -> bool {
        self.normalized().is_empty()
    }

    fn normalized(&self) -> Needles {
        fn lower(field: &Option<String>) -> Option<String> {
            field
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(str::to_lowercase)
        }
        Needles {
            query: lower(&self.query),
            domain: lower(&self.domain),
            title: lower(&self.title),
            url: lower(&self.url),
        }
    }
}

struct Needles {
    query: Option<String>,
    domain: Option<String>,
    title: Option<String>,
    url: Option<String>,
}

impl Needles {
    fn is_empty(&self) -> bool {
        self.query.is_none() && self.domain.is_none() && self.title.is_none() && self.url.is_none()
    }

    /// `None` when the tab is excluded.
    fn score(&self, tab: &Tab) -> Option<f64> {
        if self.is_empty() {
            return Some(UNFILTERED_SCORE);
        }

        let title = tab.title.to_lowercase();
        let url = tab.url.to_lowercase();
        let mut score = 0.0;

        if let Some(domain) = &self.domain {
            if !url.contains(domain.as_str()) {
                return None;
            }
            score += DOMAIN_WEIGHT;
        }
        if let Some(t) = &self.title {
            if !title.contains(t.as_str()) {
                return None;
            }
            score += TITLE_FILTER_WEIGHT;
        }
        if let Some(u) = &self.url {
            if !url.contains(u.as_str()) {
                return None;
            }
            score += URL_FILTER_WEIGHT;
        }
        if let Some(q) = &self.query {
            let in_title = title.contains(q.as_str());
            let in_url = url.contains(q.as_str());
            if !in_title && !in_url {
                return None;
            }
            if in_title {
                score += QUERY_TITLE_WEIGHT;
            }
            if in_url {
                score += QUERY_URL_WEIGHT;
            }
            if title == *q {
                score += EXACT_TITLE_BONUS;
            }
            if title.starts_with(q.as_str()) {
                score += TITLE_PREFIX_BONUS;
            }
        }
        Some(score)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub tab: Tab,
    pub score: f64,
}

/// Rank `tabs` against `query`, best first. Ties keep their input order.
pub fn search(tabs: &[Tab], query: &SearchQuery) -> Vec<SearchResult> {
    let needles = query.normalized();
    let mut results: Vec<SearchResult> = tabs
        .iter()
        .filter_map(|tab| {
            needles.score(tab).map(|score| SearchResult {
                tab: tab.clone(),
                score,
            })
        })
        .collect();

    // sort_by is stable
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results.truncate(query.effective_limit());
    results
}

/// What a caller gets back from searching the cache.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Nothing has ever been fetched; the caller should refresh first.
    NeverPopulated,
    /// A refresh succeeded but the device had no tabs.
    EmptyCache,
    Matches(Vec<SearchResult>),
}

impl SearchOutcome {
    pub fn evaluate(populated: bool, tabs: &[Tab], query: &SearchQuery) -> Self {
        if !populated {
            Self::NeverPopulated
        } else if tabs.is_empty() {
            Self::EmptyCache
        } else {
            Self::Matches(search(tabs, query))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::tab;

    fn sample() -> Vec<Tab> {
        vec![
            tab("1", "GitHub", "https://github.com/x"),
            tab("2", "Docs", "https://go.dev/doc"),
        ]
    }

    #[test]
    fn test_domain_filter_scores_two() {
        let results = search(&sample(), &SearchQuery::default().domain("github.com"));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].tab.id, "1");
        assert_eq!(results[0].score, 2.0);
    }

    #[test]
    fn test_unfiltered_lists_everything_at_nominal_score() {
        let tabs: Vec<Tab> = (0..15)
            .map(|i| tab(&i.to_string(), "t", "https://x.test"))
            .collect();
        let results = search(&tabs, &SearchQuery::default());
        assert_eq!(results.len(), 10);
        assert!(results.iter().all(|r| r.score == 0.1));
        let ids: Vec<_> = results.iter().map(|r| r.tab.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"]);

        let results = search(&sample(), &SearchQuery::default().limit(5));
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_empty_strings_count_as_absent() {
        let q = SearchQuery::default().query("").domain("").title("").url("");
        assert!(q.is_unfiltered());
        let results = search(&sample(), &q);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.score == 0.1));
    }

    #[test]
    fn test_non_positive_limit_means_default() {
        assert_eq!(SearchQuery::default().limit(0).effective_limit(), 10);
        assert_eq!(SearchQuery::default().limit(-3).effective_limit(), 10);
        assert_eq!(SearchQuery::default().limit(1).effective_limit(), 1);
    }

    #[test]
    fn test_exact_title_outranks_url_only_match() {
        let tabs = vec![
            tab("u", "Something else", "https://rust.example/rust"),
            tab("t", "Rust", "https://lang.example/"),
        ];
        let results = search(&tabs, &SearchQuery::default().query("RUST"));
        assert_eq!(results[0].tab.id, "t");
        // title hit + exact + prefix
        assert_eq!(results[0].score, 4.0);
        assert_eq!(results[1].score, 0.5);
    }

    #[test]
    fn test_query_title_and_url_hits_are_additive() {
        let tabs = vec![tab("1", "go docs", "https://go.dev/doc")];
        let results = search(&tabs, &SearchQuery::default().query("doc"));
        // title contains (1.0) + url contains (0.5), no exact, no prefix
        assert_eq!(results[0].score, 1.5);
    }

    #[test]
    fn test_all_fields_must_match() {
        let q = SearchQuery::default().domain("github.com").title("docs");
        assert!(search(&sample(), &q).is_empty());

        let q = SearchQuery::default().domain("GITHUB").title("git").url("/x").query("hub");
        let results = search(&sample(), &q);
        assert_eq!(results.len(), 1);
        // 2.0 + 1.5 + 1.0 + title 1.0 + url 0.5
        assert_eq!(results[0].score, 6.0);
    }

    #[test]
    fn test_ties_keep_cache_order_and_search_is_idempotent() {
        let tabs = vec![
            tab("a", "alpha", "https://one.test/x"),
            tab("b", "beta", "https://two.test/x"),
            tab("c", "x marks", "https://three.test/"),
            tab("d", "delta", "https://four.test/x"),
        ];
        let q = SearchQuery::default().query("x");
        let first = search(&tabs, &q);
        let ids: Vec<_> = first.iter().map(|r| r.tab.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b", "d"]);
        assert_eq!(first, search(&tabs, &q));
    }

    #[test]
    fn test_outcome_distinguishes_never_populated_and_empty() {
        let q = SearchQuery::default();
        assert_eq!(SearchOutcome::evaluate(false, &[], &q), SearchOutcome::NeverPopulated);
        assert_eq!(SearchOutcome::evaluate(true, &[], &q), SearchOutcome::EmptyCache);
        match SearchOutcome::evaluate(true, &sample(), &q.domain("nowhere")) {
            SearchOutcome::Matches(m) => assert!(m.is_empty()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_query_deserializes_from_tool_arguments() {
        let q: SearchQuery =
            serde_json::from_str(r#"{"query": "rust", "limit": 3, "domain": ""}"#).unwrap();
        assert_eq!(q.query.as_deref(), Some("rust"));
        assert_eq!(q.effective_limit(), 3);
        assert!(!q.is_unfiltered());
    }
}
