use crate::wire::{decode_in_progress, decode_messages};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tradefeed_framework::{
    Bound, FeedSource, FetchError, Granularity, MessageQuery, Record, format_cursor,
};
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// [`FeedSource`] backed by the backend's read-only HTTP query surface.
#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    base_url: Url,
    client: Client,
}

impl HttpFeedSource {
    /// `base_url` is the backend root; endpoint paths are appended to it.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, FetchError> {
        if base_url.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn messages_url(&self, query: &MessageQuery) -> Result<Url, FetchError> {
        let mut url = self.endpoint(&["api", "messages"])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("type", query.message_type.as_str())
                .append_pair("granularity", query.granularity.token())
                .append_pair("limit", &query.limit.to_string());
            match query.bound {
                Some(Bound::Before(ts)) => {
                    pairs.append_pair("before", &format_cursor(&ts));
                }
                Some(Bound::After(ts)) => {
                    pairs.append_pair("after", &format_cursor(&ts));
                }
                None => {}
            }
        }
        Ok(url)
    }

    async fn get_text(&self, url: Url) -> Result<String, FetchError> {
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            log::debug!("Backend answered {}", status);
            return Err(FetchError::Status {
                code: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch_messages(&self, query: &MessageQuery) -> Result<Vec<Record>, FetchError> {
        let url = self.messages_url(query)?;
        let body = self.get_text(url).await?;
        decode_messages(&body)
    }

    async fn fetch_in_progress(
        &self,
        granularity: Granularity,
    ) -> Result<Option<Record>, FetchError> {
        let url = self.endpoint(&["api", "in-progress", granularity.token()])?;
        let body = self.get_text(url).await?;
        decode_in_progress(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tradefeed_framework::{MessageType, RecordKind, ViewState};
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source(server: &MockServer) -> HttpFeedSource {
        let base = Url::parse(&server.uri()).unwrap();
        HttpFeedSource::new(base, Duration::from_secs(2)).unwrap()
    }

    fn trade_query(bound: Option<Bound>) -> MessageQuery {
        let view = ViewState {
            message_type: MessageType::Trade,
            granularity: Granularity::OneHour,
        };
        MessageQuery::new(view, 20, bound)
    }

    fn record_json(content: &str, timestamp: &str) -> serde_json::Value {
        serde_json::json!({
            "content": content,
            "timestamp": timestamp,
            "message_type": "trade",
        })
    }

    #[test]
    fn test_messages_url_keeps_base_path() {
        let base = Url::parse("http://localhost:8000/feed/").unwrap();
        let source = HttpFeedSource::new(base, DEFAULT_TIMEOUT).unwrap();

        let url = source.messages_url(&trade_query(None)).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/feed/api/messages?type=trade&granularity=1h&limit=20"
        );
    }

    #[test]
    fn test_rejects_non_base_url() {
        let base = Url::parse("mailto:ops@example.com").unwrap();
        assert!(matches!(
            HttpFeedSource::new(base, DEFAULT_TIMEOUT),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_older_page_sends_before_cursor() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/messages"))
            .and(query_param("type", "trade"))
            .and(query_param("granularity", "1h"))
            .and(query_param("limit", "20"))
            .and(query_param("before", "2024-05-01T10:00:00.000000"))
            .and(query_param_is_missing("after"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messages": [
                    record_json("Bought $AAPL", "2024-05-01T09:59:00"),
                    record_json("Sold $TSLA", "2024-05-01T09:58:00"),
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let cursor = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let records = source(&server)
            .fetch_messages(&trade_query(Some(Bound::Before(cursor))))
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, RecordKind::Trade);
        assert_eq!(records[0].content, "Bought $AAPL");
    }

    #[tokio::test]
    async fn test_fetch_newer_sends_after_cursor() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/messages"))
            .and(query_param("after", "2024-05-01T10:00:00.250000"))
            .and(query_param_is_missing("before"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "messages": [] })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let cursor = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
            + chrono::Duration::milliseconds(250);
        let records = source(&server)
            .fetch_messages(&trade_query(Some(Bound::After(cursor))))
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_latest_page_has_no_cursor() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/messages"))
            .and(query_param_is_missing("before"))
            .and(query_param_is_missing("after"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "messages": [] })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let records = source(&server).fetch_messages(&trade_query(None)).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_error_envelope_maps_to_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/messages"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "error": "query failed" })),
            )
            .mount(&server)
            .await;

        let result = source(&server).fetch_messages(&trade_query(None)).await;
        assert_eq!(result, Err(FetchError::Server("query failed".to_string())));
    }

    #[tokio::test]
    async fn test_http_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/messages"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&server)
            .await;

        let result = source(&server).fetch_messages(&trade_query(None)).await;
        assert_eq!(result, Err(FetchError::Status { code: 500 }));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let result = source(&server).fetch_messages(&trade_query(None)).await;
        assert!(matches!(result, Err(FetchError::Decode(_))));
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/messages"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
            .mount(&server)
            .await;

        let base = Url::parse(&server.uri()).unwrap();
        let source = HttpFeedSource::new(base, Duration::from_millis(200)).unwrap();
        let result = source.fetch_messages(&trade_query(None)).await;
        assert!(matches!(result, Err(FetchError::Transport(_))));
    }

    #[tokio::test]
    async fn test_fetch_in_progress() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/in-progress/15m"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": {
                    "content": "Building $NVDA position",
                    "timestamp": "2024-05-01T10:15:00",
                    "message_type": "trade",
                    "status": "in_progress",
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/in-progress/1d"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "message": null })),
            )
            .mount(&server)
            .await;

        let source = source(&server);
        let record = source
            .fetch_in_progress(Granularity::FifteenMinutes)
            .await
            .unwrap()
            .unwrap();
        assert!(record.is_in_progress());
        assert_eq!(source.fetch_in_progress(Granularity::OneDay).await, Ok(None));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let base = Url::parse("http://127.0.0.1:9/").unwrap();
        let source = HttpFeedSource::new(base, Duration::from_secs(1)).unwrap();
        let result = source.fetch_messages(&trade_query(None)).await;
        assert!(matches!(result, Err(FetchError::Transport(_))));
    }
}
