use std::time::Duration;

use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
    Client, RequestBuilder, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{trace, Instrument, Span};
use url::Url;

use super::cancellable;
use crate::{
    errors::{ClientError, Result},
    quirks,
};

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// JSON dialect a backend speaks on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Integers as quoted decimal strings.
    Canonical,
    /// Bare integers; rewritten through the quirk translator in both directions.
    Loose,
}

/// One HTTP transport handle per adapter, bound to the node's base url.
#[derive(Debug, Clone)]
pub struct ClientWithBaseUrl {
    client: Client,
    base_url: Url,
    dialect: Dialect,
    cancel: CancellationToken,
    span: Span,
}

impl ClientWithBaseUrl {
    pub fn new(
        base_url: Url,
        request_timeout: Duration,
        dialect: Dialect,
        cancel: CancellationToken,
        span: Span,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_CONTENT_TYPE));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            dialect,
            cancel,
            span,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn url(&self, endpoint: &str) -> Result<Url> {
        Ok(join_endpoint(&self.base_url, endpoint)?)
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let body = self.execute(self.client.get(self.url(endpoint)?)).await?;
        self.decode(endpoint, &body)
    }

    /// Like [`Self::get`], but a 404 answer is `None`.
    pub async fn get_optional<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Option<T>> {
        match self.get(endpoint).await {
            Ok(value) => Ok(Some(value)),
            Err(ClientError::BackendRejected { status, .. })
                if status == StatusCode::NOT_FOUND.as_u16() =>
            {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn post<B, T>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send_body(endpoint, body).await?;
        self.decode(endpoint, &response)
    }

    /// POST whose answer carries no data; an empty or `null` body is success.
    pub async fn post_empty<B: Serialize + ?Sized>(&self, endpoint: &str, body: &B) -> Result<()> {
        self.send_body(endpoint, body).await.map(|_| ())
    }

    async fn send_body<B: Serialize + ?Sized>(&self, endpoint: &str, body: &B) -> Result<Vec<u8>> {
        let body = self.encode(endpoint, body)?;
        self.execute(self.client.post(self.url(endpoint)?).body(body))
            .await
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Vec<u8>> {
        let request = request.build()?;
        let method = request.method().clone();
        let url = request.url().clone();
        let client = self.client.clone();
        let exchange = async move {
            trace!(%method, %url, "sending request");
            let response = client.execute(request).await?;
            let status = response.status();
            let body = response.bytes().await?;
            trace!(%method, %url, %status, bytes = body.len(), "received response");
            if status.is_success() {
                Ok::<_, ClientError>(body.to_vec())
            } else {
                Err(ClientError::BackendRejected {
                    status: status.as_u16(),
                    message: rejection_message(&body),
                })
            }
        };
        cancellable(&self.cancel, exchange.instrument(self.span.clone())).await?
    }

    fn encode<B: Serialize + ?Sized>(&self, endpoint: &str, body: &B) -> Result<Vec<u8>> {
        let json = serde_json::to_vec(body).map_err(|err| ClientError::decoding(endpoint, err))?;
        Ok(match self.dialect {
            Dialect::Canonical => json,
            Dialect::Loose => quirks::to_loose(&json),
        })
    }

    fn decode<T: DeserializeOwned>(&self, endpoint: &str, body: &[u8]) -> Result<T> {
        let result = match self.dialect {
            Dialect::Canonical => serde_json::from_slice(body),
            Dialect::Loose => serde_json::from_slice(&quirks::to_canonical(body)),
        };
        result.map_err(|err| ClientError::decoding(endpoint, err))
    }
}

/// Appends `endpoint` below the base url's path, so a node served under a path prefix keeps it.
pub fn join_endpoint(
    base_url: &Url,
    endpoint: &str,
) -> std::result::Result<Url, url::ParseError> {
    let mut base_url = base_url.clone();
    if !base_url.path().ends_with('/') {
        let path = format!("{}/", base_url.path());
        base_url.set_path(&path);
    }
    base_url.join(endpoint.trim_start_matches('/'))
}

/// The `message` of a JSON error body, otherwise the body text itself.
fn rejection_message(body: &[u8]) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: String,
    }

    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(error) => error.message,
        Err(_) => String::from_utf8_lossy(body).trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use rstest::rstest;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Counter {
        #[serde(with = "crate::types::quoted::quoted_u64")]
        slot: u64,
    }

    fn client(server: &MockServer, dialect: Dialect) -> ClientWithBaseUrl {
        ClientWithBaseUrl::new(
            Url::parse(&server.base_url()).unwrap(),
            Duration::from_secs(5),
            dialect,
            CancellationToken::new(),
            Span::none(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn loose_dialect_is_translated_both_ways() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/counter").body(r#"{"slot":5}"#);
                then.status(200).body(r#"{"slot":6}"#);
            })
            .await;

        let client = client(&server, Dialect::Loose);
        let answer: Counter = client.post("/counter", &Counter { slot: 5 }).await.unwrap();
        assert_eq!(answer, Counter { slot: 6 });
        mock.assert_async().await;
    }

    #[rstest]
    #[case("http://node:5052", "/eth/v1/node/version", "http://node:5052/eth/v1/node/version")]
    #[case("http://node:5052/", "/eth/v1/node/version", "http://node:5052/eth/v1/node/version")]
    #[case("http://host/proxy", "/eth/v1/node/version", "http://host/proxy/eth/v1/node/version")]
    #[case("http://host/proxy/", "/beacon/head", "http://host/proxy/beacon/head")]
    #[case("http://host/proxy/", "/beacon/block?slot=3", "http://host/proxy/beacon/block?slot=3")]
    fn endpoints_keep_the_base_path(
        #[case] base: &str,
        #[case] endpoint: &str,
        #[case] expected: &str,
    ) {
        let joined = join_endpoint(&Url::parse(base).unwrap(), endpoint).unwrap();
        assert_eq!(joined.as_str(), expected);
    }

    #[tokio::test]
    async fn requests_reach_a_node_under_a_path_prefix() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/proxy/counter");
                then.status(200).body(r#"{"slot":"3"}"#);
            })
            .await;

        let client = ClientWithBaseUrl::new(
            Url::parse(&server.url("/proxy")).unwrap(),
            Duration::from_secs(5),
            Dialect::Canonical,
            CancellationToken::new(),
            Span::none(),
        )
        .unwrap();
        assert_eq!(client.get::<Counter>("/counter").await.unwrap(), Counter { slot: 3 });
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rejections_keep_the_server_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/json");
                then.status(400)
                    .body(r#"{"code":400,"message":"invalid slot"}"#);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/text");
                then.status(500).body("internal failure\n");
            })
            .await;

        let client = client(&server, Dialect::Canonical);
        let err = client.get::<Counter>("/json").await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::BackendRejected { status: 400, ref message } if message == "invalid slot"
        ));
        let err = client.get::<Counter>("/text").await.unwrap_err();
        assert_eq!(err.rejection_message(), Some("internal failure"));
    }

    #[tokio::test]
    async fn missing_resources_are_none() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/missing");
                then.status(404).body(r#"{"code":404,"message":"not found"}"#);
            })
            .await;

        let client = client(&server, Dialect::Canonical);
        assert_eq!(client.get_optional::<Counter>("/missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn malformed_payload_names_the_endpoint() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/counter");
                then.status(200).body(r#"{"slot":"-1"}"#);
            })
            .await;

        let client = client(&server, Dialect::Canonical);
        match client.get::<Counter>("/counter").await {
            Err(ClientError::Decoding { path, message }) => {
                assert_eq!(path, "/counter");
                assert!(message.contains("negative"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancelled_requests_fail_promptly() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/slow");
                then.status(200)
                    .delay(Duration::from_secs(30))
                    .body(r#"{"slot":"1"}"#);
            })
            .await;

        let client = client(&server, Dialect::Canonical);
        client.cancel_token().cancel();
        let err = client.get::<Counter>("/slow").await.unwrap_err();
        assert!(err.is_cancelled());
    }
}
