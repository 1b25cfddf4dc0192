use futures::future::BoxFuture;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::config::Config;
use crate::error::SyncError;

/// A source of raw feed payloads.
///
/// The pager only needs "give me the bytes"; tests substitute a scripted
/// source for the HTTP client.
pub trait FeedSource: Send + Sync {
  fn fetch(&self) -> BoxFuture<'_, Result<Vec<u8>, SyncError>>;
}

/// HTTP client for the fixed feed endpoint.
#[derive(Clone)]
pub struct HttpFeedClient {
  client: reqwest::Client,
  url: Url,
}

impl HttpFeedClient {
  pub fn new(url: Url, timeout: Duration) -> Result<Self, SyncError> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
      .build()?;

    Ok(Self { client, url })
  }

  pub fn from_config(config: &Config) -> Result<Self, SyncError> {
    Self::new(config.feed.url.clone(), config.feed.timeout())
  }

  pub fn url(&self) -> &Url {
    &self.url
  }

  async fn get(&self) -> Result<Vec<u8>, SyncError> {
    debug!(url = %self.url, "Fetching feed");

    let response = self
      .client
      .get(self.url.clone())
      .send()
      .await?
      .error_for_status()?;

    let body = response.bytes().await?;
    info!(bytes = body.len(), "Fetched feed");

    Ok(body.to_vec())
  }
}

impl FeedSource for HttpFeedClient {
  fn fetch(&self) -> BoxFuture<'_, Result<Vec<u8>, SyncError>> {
    Box::pin(self.get())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tokio::io::{AsyncReadExt, AsyncWriteExt};
  use tokio::net::TcpListener;

  /// Serve one connection on a local port, answering with `response` (or
  /// never answering when `None`).
  async fn serve_once(response: Option<&'static str>) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
      let (mut socket, _) = listener.accept().await.unwrap();
      let mut buf = [0u8; 4096];
      let _ = socket.read(&mut buf).await;
      match response {
        Some(response) => {
          let _ = socket.write_all(response.as_bytes()).await;
          let _ = socket.shutdown().await;
        }
        None => tokio::time::sleep(Duration::from_secs(10)).await,
      }
    });

    Url::parse(&format!("http://{}/apps.json", addr)).unwrap()
  }

  #[tokio::test]
  async fn test_success_returns_body() {
    let url = serve_once(Some(
      "HTTP/1.1 200 OK\r\nContent-Length: 12\r\nConnection: close\r\n\r\n{\"feed\": {}}",
    ))
    .await;
    let client = HttpFeedClient::new(url, Duration::from_secs(5)).unwrap();

    let body = client.fetch().await.unwrap();
    assert_eq!(body, br#"{"feed": {}}"#.to_vec());
  }

  #[tokio::test]
  async fn test_non_success_status_is_transport_error() {
    let url = serve_once(Some(
      "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
    ))
    .await;
    let client = HttpFeedClient::new(url, Duration::from_secs(5)).unwrap();

    match client.fetch().await {
      Err(SyncError::Transport(msg)) => assert!(msg.contains("503"), "message: {}", msg),
      other => panic!("unexpected result: {:?}", other),
    }
  }

  #[tokio::test]
  async fn test_silent_server_times_out() {
    let url = serve_once(None).await;
    let client = HttpFeedClient::new(url, Duration::from_secs(1)).unwrap();

    match client.fetch().await {
      Err(SyncError::Transport(msg)) => assert!(msg.contains("timed out"), "message: {}", msg),
      other => panic!("unexpected result: {:?}", other),
    }
  }

  #[tokio::test]
  async fn test_unreachable_host_is_transport_error() {
    // Grab a free port, then close it so nothing is listening
    let addr = TcpListener::bind("127.0.0.1:0")
      .await
      .unwrap()
      .local_addr()
      .unwrap();
    let url = Url::parse(&format!("http://{}/apps.json", addr)).unwrap();
    let client = HttpFeedClient::new(url, Duration::from_secs(2)).unwrap();

    let result = client.fetch().await;
    assert!(matches!(result, Err(SyncError::Transport(_))));
  }
}
