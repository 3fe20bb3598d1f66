use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://radio.animebits.moe";

/// One entry of the `/api/search` response array
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchResult {
    pub artist: String,
    pub title: String,
    pub album: String,
    pub hash: String,
}

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    /// Sent as the basic-auth password with an empty username.
    pub api_key: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_search_results() {
        let body = r#"[
            {"artist": "ALI PROJECT", "title": "Waltz", "album": "Gothic", "hash": "abc123", "id": 7},
            {"artist": "fripSide", "title": "only my railgun", "album": "", "hash": "def456"}
        ]"#;
        let results: Vec<SearchResult> = serde_json::from_str(body).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].hash, "abc123");
        assert_eq!(results[1].album, "");
    }
}
