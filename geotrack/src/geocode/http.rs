//! HTTP client abstraction for testability

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;

use super::error::GeocodeError;
use crate::BoxFuture;

/// Trait for async HTTP GET operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an HTTP GET request.
    ///
    /// # Returns
    ///
    /// The response body as bytes, or an error for transport failures and
    /// non-2xx statuses.
    fn get(&self, url: &str) -> BoxFuture<'_, Result<Vec<u8>, GeocodeError>>;
}

/// Real HTTP client implementation using reqwest.
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient.
    ///
    /// Public geocoding services reject requests without an identifying
    /// user agent, so one is required.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| GeocodeError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for ReqwestClient {
    fn get(&self, url: &str) -> BoxFuture<'_, Result<Vec<u8>, GeocodeError>> {
        let url = url.to_string();
        Box::pin(async move {
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| GeocodeError::Http(format!("Request failed: {}", e)))?;

            // Check HTTP status
            if !response.status().is_success() {
                return Err(GeocodeError::Status {
                    status: response.status().as_u16(),
                    url,
                });
            }

            response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| GeocodeError::Http(format!("Failed to read response: {}", e)))
        })
    }
}

/// Scripted reply for [`MockHttpClient`].
#[derive(Debug, Clone)]
struct MockReply {
    delay: Duration,
    response: Result<Vec<u8>, GeocodeError>,
}

/// Mock HTTP client for testing.
///
/// Queued replies are consumed in request order; once the queue is empty
/// every request gets the default reply.
#[derive(Debug)]
pub struct MockHttpClient {
    default: MockReply,
    queue: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<String>>,
}

impl MockHttpClient {
    pub fn new(response: Result<Vec<u8>, GeocodeError>) -> Self {
        Self {
            default: MockReply {
                delay: Duration::ZERO,
                response,
            },
            queue: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Client answering every request with a JSON body.
    pub fn json(body: &str) -> Self {
        Self::new(Ok(body.as_bytes().to_vec()))
    }

    /// Client failing every request at the transport level.
    pub fn failing() -> Self {
        Self::new(Err(GeocodeError::Http("connection refused".to_string())))
    }

    /// Queue a reply delivered after `delay`.
    pub fn push_reply(&self, delay: Duration, response: Result<Vec<u8>, GeocodeError>) {
        self.queue.lock().push_back(MockReply { delay, response });
    }

    /// URLs requested so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

impl AsyncHttpClient for MockHttpClient {
    fn get(&self, url: &str) -> BoxFuture<'_, Result<Vec<u8>, GeocodeError>> {
        self.requests.lock().push(url.to_string());
        let reply = self
            .queue
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.default.clone());

        Box::pin(async move {
            if !reply.delay.is_zero() {
                tokio::time::sleep(reply.delay).await;
            }
            reply.response
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_client_success() {
        let mock = MockHttpClient::new(Ok(vec![1, 2, 3, 4]));

        let result = mock.get("http://example.com").await;
        assert_eq!(result, Ok(vec![1, 2, 3, 4]));
        assert_eq!(mock.requests(), vec!["http://example.com".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_client_error() {
        let mock = MockHttpClient::failing();

        let result = mock.get("http://example.com").await;
        assert!(matches!(result, Err(GeocodeError::Http(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_client_queue_then_default() {
        let mock = MockHttpClient::json("{}");
        mock.push_reply(Duration::from_millis(300), Ok(b"first".to_vec()));

        let started = tokio::time::Instant::now();
        assert_eq!(mock.get("a").await, Ok(b"first".to_vec()));
        assert!(started.elapsed() >= Duration::from_millis(300));
        assert_eq!(mock.get("b").await, Ok(b"{}".to_vec()));
    }

    #[test]
    fn test_reqwest_client_builds() {
        assert!(ReqwestClient::new("geotrack-test", Duration::from_secs(5)).is_ok());
    }
}
