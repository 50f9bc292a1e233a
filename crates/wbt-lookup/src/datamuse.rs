use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use wbt_types::SearchMode;

use crate::{LookupError, LookupQuery, SuggestionProvider};

#[derive(Debug, Deserialize)]
struct DatamuseWord {
    word: String,
}

/// Datamuse `/words` client
#[derive(Clone)]
pub struct DatamuseClient {
    client: reqwest::Client,
    api_url: String,
}

impl DatamuseClient {
    pub fn new(api_url: String, timeout: Duration) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::Api(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, api_url })
    }
}

/// Query string for one lookup; `*` is the Datamuse wildcard
pub(crate) fn query_params(query: &LookupQuery) -> Vec<(&'static str, String)> {
    let term = &query.term;
    let pattern = match query.mode {
        SearchMode::StartsWith => ("sp", format!("{term}*")),
        SearchMode::EndsWith => ("sp", format!("*{term}")),
        SearchMode::Contains => ("sp", format!("*{term}*")),
        SearchMode::Rhymes => ("rel_rhy", term.clone()),
        SearchMode::RelatedWords => ("rel_jja", term.clone()),
    };
    vec![("max", query.max_results.to_string()), pattern]
}

#[async_trait]
impl SuggestionProvider for DatamuseClient {
    async fn suggest(&self, query: &LookupQuery) -> Result<Vec<String>, LookupError> {
        if query.term.is_empty() {
            return Ok(Vec::new());
        }

        tracing::info!(mode = %query.mode, term = %query.term, "lookup request");

        let response = self
            .client
            .get(&self.api_url)
            .query(&query_params(query))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LookupError::Api(format!("HTTP {}", response.status())));
        }

        let words: Vec<DatamuseWord> = response.json().await?;

        Ok(words
            .into_iter()
            .map(|w| w.word)
            .filter(|w| w.split_whitespace().count() == 1)
            .take(query.max_results)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;
    use wbt_types::ProviderStatus;

    /// Serves `body` once as a JSON response and returns the base URL
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = socket.read(&mut buf).await;
            let reply = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
        });
        format!("http://{addr}/words")
    }

    #[test]
    fn test_query_patterns() {
        let params = |mode| query_params(&LookupQuery::new("cat", mode, 50));
        assert_eq!(
            params(SearchMode::StartsWith),
            vec![("max", "50".to_string()), ("sp", "cat*".to_string())]
        );
        assert_eq!(params(SearchMode::EndsWith)[1], ("sp", "*cat".to_string()));
        assert_eq!(params(SearchMode::Contains)[1], ("sp", "*cat*".to_string()));
        assert_eq!(params(SearchMode::Rhymes)[1], ("rel_rhy", "cat".to_string()));
        assert_eq!(
            params(SearchMode::RelatedWords)[1],
            ("rel_jja", "cat".to_string())
        );
    }

    #[tokio::test]
    async fn test_filters_phrases_and_caps() {
        let url = serve_once(
            "200 OK",
            r#"[{"word":"cats","score":900},{"word":"cat nap","score":800},{"word":"catalog"},{"word":"scat"}]"#,
        )
        .await;
        let client = DatamuseClient::new(url, Duration::from_secs(5)).unwrap();

        let words = client
            .suggest(&LookupQuery::new("cat", SearchMode::Contains, 2))
            .await
            .unwrap();
        assert_eq!(words, vec!["cats".to_string(), "catalog".to_string()]);
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let url = serve_once("503 Service Unavailable", "[]").await;
        let client = DatamuseClient::new(url, Duration::from_secs(5)).unwrap();

        let err = client
            .suggest(&LookupQuery::new("cat", SearchMode::Contains, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::Api(_)));
        assert_eq!(err.status(), ProviderStatus::Error);
    }

    #[tokio::test]
    async fn test_unreachable_is_offline() {
        // Bind then drop so the port is closed
        let addr = TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap()
            .local_addr()
            .unwrap();
        let client =
            DatamuseClient::new(format!("http://{addr}/words"), Duration::from_secs(5)).unwrap();

        let err = client
            .suggest(&LookupQuery::new("cat", SearchMode::Contains, 10))
            .await
            .unwrap_err();
        assert_eq!(err.status(), ProviderStatus::Offline);
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });
        let client =
            DatamuseClient::new(format!("http://{addr}/words"), Duration::from_millis(200))
                .unwrap();

        let err = client
            .suggest(&LookupQuery::new("cat", SearchMode::Contains, 10))
            .await
            .unwrap_err();
        assert_eq!(err.status(), ProviderStatus::Timeout);
    }

    #[tokio::test]
    async fn test_empty_term_skips_request() {
        let client =
            DatamuseClient::new("http://127.0.0.1:9/words".into(), Duration::from_secs(1)).unwrap();
        let words = client
            .suggest(&LookupQuery::new("", SearchMode::Contains, 10))
            .await
            .unwrap();
        assert!(words.is_empty());
    }
}
