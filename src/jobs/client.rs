use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use thiserror::Error;
use url::Url;

/// Minimal GraphQL-over-HTTP client used by the scheduled jobs.
#[derive(Clone)]
pub struct GraphqlClient {
    http: Client,
    endpoint: Url,
    retries: u32,
}

impl GraphqlClient {
    /// `retries` is the number of extra attempts after a transport failure or 5xx.
    pub fn new(endpoint: Url, retries: u32, http: Client) -> Self {
        Self {
            http,
            endpoint,
            retries,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Executes a query and returns its `data`, or the first failure after retries.
    pub async fn execute<T>(&self, query: &str, variables: Option<Value>) -> Result<T, GraphqlClientError>
    where
        T: DeserializeOwned,
    {
        let body = json!({
            "query": query,
            "variables": variables.unwrap_or(Value::Null),
        });

        let mut attempt = 0;
        loop {
            match self.send(&body).await {
                Err(err) if err.is_retryable() && attempt < self.retries => {
                    attempt += 1;
                    tracing::warn!(
                        endpoint = %self.endpoint,
                        attempt,
                        error = %err,
                        "graphql request failed, retrying"
                    );
                }
                result => return result,
            }
        }
    }

    async fn send<T>(&self, body: &Value) -> Result<T, GraphqlClientError>
    where
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<unavailable>"));
            return Err(GraphqlClientError::Status { status, body });
        }

        let envelope: GraphqlEnvelope<T> = response.json().await?;
        if let Some(errors) = envelope.errors.filter(|errors| !errors.is_empty()) {
            return Err(GraphqlClientError::Graphql(
                errors.into_iter().map(|e| e.message).collect(),
            ));
        }
        envelope.data.ok_or(GraphqlClientError::MissingData)
    }
}

#[derive(Debug, Deserialize)]
struct GraphqlEnvelope<T> {
    data: Option<T>,
    errors: Option<Vec<GraphqlErrorMessage>>,
}

#[derive(Debug, Deserialize)]
struct GraphqlErrorMessage {
    message: String,
}

/// Errors produced by the GraphQL client.
#[derive(Debug, Error)]
pub enum GraphqlClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("GraphQL errors: {}", .0.join("; "))]
    Graphql(Vec<String>),
    #[error("response contained no data")]
    MissingData,
}

impl GraphqlClientError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Http(err) => !err.is_decode(),
            Self::Status { status, .. } => status.is_server_error(),
            Self::Graphql(_) | Self::MissingData => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[derive(Debug, Deserialize)]
    struct Hello {
        hello: String,
    }

    fn client(server: &MockServer, retries: u32) -> GraphqlClient {
        GraphqlClient::new(
            Url::parse(&server.url("/graphql")).expect("url"),
            retries,
            Client::builder().build().expect("client"),
        )
    }

    #[tokio::test]
    async fn execute_returns_data() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/graphql")
                    .json_body(serde_json::json!({ "query": "{ hello }", "variables": null }));
                then.status(200)
                    .json_body(serde_json::json!({ "data": { "hello": "Hello, GraphQL!" } }));
            })
            .await;

        let data: Hello = client(&server, 3)
            .execute("{ hello }", None)
            .await
            .expect("query succeeds");

        mock.assert_async().await;
        assert_eq!(data.hello, "Hello, GraphQL!");
    }

    #[tokio::test]
    async fn graphql_errors_are_not_retried() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql");
                then.status(200).json_body(serde_json::json!({
                    "data": null,
                    "errors": [{ "message": "Unknown field" }, { "message": "bad" }]
                }));
            })
            .await;

        let err = client(&server, 3)
            .execute::<Hello>("{ nope }", None)
            .await
            .expect_err("graphql errors surface");

        assert_eq!(mock.hits_async().await, 1);
        assert_eq!(err.to_string(), "GraphQL errors: Unknown field; bad");
    }

    #[tokio::test]
    async fn server_errors_retry_the_configured_count() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql");
                then.status(503).body("unavailable");
            })
            .await;

        let err = client(&server, 3)
            .execute::<Hello>("{ hello }", None)
            .await
            .expect_err("stays unavailable");

        assert_eq!(mock.hits_async().await, 4);
        match err {
            GraphqlClientError::Status { status, body } => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(body, "unavailable");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql");
                then.status(400).body("bad request");
            })
            .await;

        client(&server, 3)
            .execute::<Hello>("{ hello }", None)
            .await
            .expect_err("bad request");

        assert_eq!(mock.hits_async().await, 1);
    }
}
