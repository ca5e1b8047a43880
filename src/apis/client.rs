/// Base HTTP client shared by the API clients
use crate::errors::OracleError;
use crate::logger::{self, LogTag};
use reqwest::{Client, RequestBuilder, Response};
use std::time::{Duration, Instant};

/// HTTP client wrapper with a per-request timeout
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(timeout_secs: u64) -> Result<Self, String> {
        let timeout = Duration::from_secs(timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self { client, timeout })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send a request and read the body
    ///
    /// Transport failures and timeouts map to [`OracleError::Network`],
    /// non-2xx statuses to [`OracleError::HttpStatus`].
    pub async fn send_text(
        &self,
        request: RequestBuilder,
        endpoint: &str,
    ) -> Result<String, OracleError> {
        let start = Instant::now();
        let response: Response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                OracleError::Network(format!("{} timed out after {:?}", endpoint, self.timeout))
            } else {
                OracleError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OracleError::InvalidResponse(e.to_string()))?;

        logger::debug(
            LogTag::Api,
            &format!(
                "{} -> {} in {}ms ({} bytes)",
                endpoint,
                status.as_u16(),
                start.elapsed().as_millis(),
                body.len()
            ),
        );

        if !status.is_success() {
            return Err(OracleError::HttpStatus {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        Ok(body)
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 4), "abcd...");
    }

    #[test]
    fn test_client_keeps_timeout() {
        let client = HttpClient::new(7).unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(7));
    }
}
