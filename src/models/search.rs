use serde::Deserialize;

/// Completions for a partial search query.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSuggestions {
    pub query: String,
    pub suggestions: Vec<String>,
    pub count: usize,
}

/// Keywords that show up most across published articles.
#[derive(Debug, Clone, Deserialize)]
pub struct PopularSearches {
    pub popular_searches: Vec<String>,
    pub count: usize,
}
