use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use qa_core::{ComputationClient, Error, Pod, ResultTree, Subpod};

const DEFAULT_BASE_URL: &str = "https://api.wolframalpha.com";

pub struct WolframClient {
    client: Client,
    app_id: String,
    base_url: String,
}

impl WolframClient {
    pub fn new(app_id: impl Into<String>) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .user_agent(concat!("quick-answer/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            app_id: app_id.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn query_url(&self) -> String {
        format!("{}/v2/query", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ComputationClient for WolframClient {
    fn name(&self) -> &str {
        "wolfram"
    }

    async fn query(&self, input: &str) -> Result<Option<ResultTree>, Error> {
        debug!(input, "Wolfram|Alpha query");

        let response = self
            .client
            .get(self.query_url())
            .query(&[
                ("appid", self.app_id.as_str()),
                ("input", input),
                ("output", "json"),
                ("format", "image,plaintext"),
            ])
            .send()
            .await
            .map_err(|e| Error::network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::network(e.to_string()))?;

        interpret(status.as_u16(), &body)
    }
}

/// Map an HTTP status and body to a result tree. Non-2xx statuses become
/// [`Error::Api`] carrying the raw body.
fn interpret(status: u16, body: &str) -> Result<Option<ResultTree>, Error> {
    if !(200..300).contains(&status) {
        return Err(Error::api(status, body));
    }
    parse_response(body)
}

/// Interpret a v2 query response body.
fn parse_response(body: &str) -> Result<Option<ResultTree>, Error> {
    let envelope: WolframEnvelope = serde_json::from_str(body)
        .map_err(|e| Error::serialization(format!("Wolfram|Alpha response: {}", e)))?;
    let result = envelope.queryresult;

    match result.error {
        serde_json::Value::Bool(true) => {
            return Err(Error::api(200, "Wolfram|Alpha reported an error"));
        }
        serde_json::Value::Object(ref detail) => {
            let message = detail
                .get("msg")
                .and_then(|m| m.as_str())
                .unwrap_or("Wolfram|Alpha reported an error");
            return Err(Error::api(200, message));
        }
        _ => {}
    }

    if !result.success {
        return Ok(None);
    }

    let Some(pods) = result.pods else {
        return Ok(None);
    };

    let pods = pods
        .into_iter()
        .map(|pod| Pod {
            title: pod.title,
            primary: pod.primary,
            subpods: pod
                .subpods
                .into_iter()
                .map(|subpod| Subpod {
                    image: subpod.img.map(|img| img.src),
                    plaintext: subpod.plaintext.unwrap_or_default(),
                })
                .collect(),
        })
        .collect();

    Ok(Some(ResultTree::new(pods)))
}

// Wolfram|Alpha API types

#[derive(Debug, Deserialize)]
struct WolframEnvelope {
    queryresult: WolframQueryResult,
}

#[derive(Debug, Deserialize)]
struct WolframQueryResult {
    #[serde(default)]
    success: bool,
    /// `false`, `true`, or an object with `code` and `msg`.
    #[serde(default)]
    error: serde_json::Value,
    #[serde(default)]
    pods: Option<Vec<WolframPod>>,
}

#[derive(Debug, Deserialize)]
struct WolframPod {
    title: String,
    #[serde(default)]
    primary: bool,
    #[serde(default)]
    subpods: Vec<WolframSubpod>,
}

#[derive(Debug, Deserialize)]
struct WolframSubpod {
    #[serde(default)]
    img: Option<WolframImage>,
    #[serde(default)]
    plaintext: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WolframImage {
    src: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = WolframClient::new("APP-ID").with_base_url("http://localhost:9000/");
        assert_eq!(client.name(), "wolfram");
        assert_eq!(client.query_url(), "http://localhost:9000/v2/query");
    }

    #[test]
    fn test_parse_pods() {
        let body = r#"{
            "queryresult": {
                "success": true,
                "error": false,
                "numpods": 2,
                "pods": [
                    {
                        "title": "Input",
                        "id": "Input",
                        "subpods": [
                            {"img": {"src": "https://www5b.wolframalpha.com/MSP/in.gif", "width": 40}, "plaintext": "2+2"}
                        ]
                    },
                    {
                        "title": "Result",
                        "primary": true,
                        "subpods": [
                            {"img": {"src": "https://www5b.wolframalpha.com/MSP/out.gif"}, "plaintext": "4"},
                            {"plaintext": null}
                        ]
                    }
                ]
            }
        }"#;

        let tree = parse_response(body).unwrap().unwrap();
        assert_eq!(tree.pods.len(), 2);
        assert!(!tree.pods[0].primary);
        assert!(tree.pods[1].primary);
        assert_eq!(
            tree.pods[1].subpods[0].image.as_deref(),
            Some("https://www5b.wolframalpha.com/MSP/out.gif")
        );
        assert_eq!(tree.pods[1].subpods[0].plaintext, "4");
        assert_eq!(tree.pods[1].subpods[1], Subpod::text_only(""));
    }

    #[test]
    fn test_parse_no_answer() {
        let body = r#"{"queryresult": {"success": false, "error": false, "numpods": 0}}"#;
        assert_eq!(parse_response(body).unwrap(), None);

        let body = r#"{"queryresult": {"success": true, "error": false}}"#;
        assert_eq!(parse_response(body).unwrap(), None);
    }

    #[test]
    fn test_parse_error_object() {
        let body = r#"{"queryresult": {"success": false, "error": {"code": "1", "msg": "Invalid appid"}}}"#;
        let err = parse_response(body).unwrap_err();
        assert!(err.to_string().contains("Invalid appid"));
    }

    #[test]
    fn test_parse_malformed() {
        let err = parse_response("<html>").unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
        assert!(err.to_string().contains("Wolfram|Alpha response"));
    }

    #[test]
    fn test_interpret_status() {
        let err = interpret(503, "busy").unwrap_err();
        match &err {
            Error::Api { status, message } => {
                assert_eq!(*status, 503);
                assert_eq!(message, "busy");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
        assert!(err.is_retryable());

        let err = interpret(403, "Invalid appid").unwrap_err();
        assert!(matches!(err, Error::Api { status: 403, .. }));
        assert!(!err.is_retryable());

        let body = r#"{"queryresult": {"success": true, "error": false, "pods": [
            {"title": "Result", "primary": true, "subpods": [{"plaintext": "4"}]}
        ]}}"#;
        let tree = interpret(200, body).unwrap().unwrap();
        assert_eq!(tree.pods[0].subpods[0].plaintext, "4");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_network_error() {
        let client = WolframClient::new("APP-ID").with_base_url("http://127.0.0.1:1");
        let err = client.query("2+2").await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
        assert!(err.is_retryable());
    }
}
