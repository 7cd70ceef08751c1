//! Remote persistence backend.
//!
//! The progress document can be pushed to a version-controlled content store
//! instead of (or in addition to) the local file. Updates are a
//! read-modify-write: fetch the current revision marker, then upload the new
//! content together with that marker so the store rejects a conflicting write.

use std::fmt;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::cfr::config::RemoteConfig;
use crate::cfr::error::{EngineError, EngineResult, StorageError};

/// A document fetched from a remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDocument {
    /// Revision marker to send back when updating.
    pub revision: String,
    /// Raw document bytes.
    pub content: Vec<u8>,
}

/// A remote store holding one document.
pub trait ContentStore {
    /// Fetch the current document, or `None` if it does not exist yet.
    fn fetch(&self) -> EngineResult<Option<RemoteDocument>>;

    /// Create or update the document.
    ///
    /// `revision` must be the marker of the version being replaced, or `None`
    /// when creating. Returns the new revision marker if the store reports one.
    fn upsert(&self, content: &[u8], revision: Option<&str>) -> EngineResult<Option<String>>;
}

/// Content store backed by the GitHub contents API.
#[derive(Clone)]
pub struct GithubContents {
    client: Client,
    url: String,
    token: String,
    commit_message: String,
}

#[derive(Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct UpsertResponse {
    content: Option<UpsertContent>,
}

#[derive(Deserialize)]
struct UpsertContent {
    sha: String,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

impl GithubContents {
    /// Build a client for the document described by `config`.
    ///
    /// Fails with [`EngineError::Configuration`] if the configuration is
    /// invalid or the token variable is unset.
    pub fn new(config: &RemoteConfig) -> EngineResult<Self> {
        config.validate()?;
        let token = config.token()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(StorageError::from)?;

        Ok(Self {
            client,
            url: config.contents_url(),
            token,
            commit_message: config.commit_message.clone(),
        })
    }

    /// URL of the document.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn authorization(&self) -> String {
        format!("token {}", self.token)
    }
}

impl fmt::Debug for GithubContents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubContents")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .field("commit_message", &self.commit_message)
            .finish_non_exhaustive()
    }
}

impl ContentStore for GithubContents {
    fn fetch(&self) -> EngineResult<Option<RemoteDocument>> {
        log::debug!("{:<32}{:<32}", "fetching remote progress", self.url);
        let response = self
            .client
            .get(&self.url)
            .header(AUTHORIZATION, self.authorization())
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .map_err(StorageError::from)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(status_error(response));
        }

        let body: ContentsResponse = response.json().map_err(StorageError::from)?;
        let content = match body.content {
            Some(encoded) => decode_content(&encoded)?,
            None => Vec::new(),
        };
        Ok(Some(RemoteDocument {
            revision: body.sha,
            content,
        }))
    }

    fn upsert(&self, content: &[u8], revision: Option<&str>) -> EngineResult<Option<String>> {
        log::debug!("{:<32}{:<32}", "uploading remote progress", self.url);
        let request = UpsertRequest {
            message: &self.commit_message,
            content: STANDARD.encode(content),
            sha: revision,
        };
        let response = self
            .client
            .put(&self.url)
            .header(AUTHORIZATION, self.authorization())
            .header(ACCEPT, "application/vnd.github+json")
            .json(&request)
            .send()
            .map_err(StorageError::from)?;

        if !matches!(response.status(), StatusCode::OK | StatusCode::CREATED) {
            return Err(status_error(response));
        }

        // A missing or unexpected body still means the write landed.
        let revision = response
            .json::<UpsertResponse>()
            .ok()
            .and_then(|body| body.content)
            .map(|content| content.sha);
        Ok(revision)
    }
}

fn status_error(response: reqwest::blocking::Response) -> EngineError {
    let status = response.status().as_u16();
    let body = response.text().unwrap_or_default();
    StorageError::Status { status, body }.into()
}

/// Decode base64 content as served by the contents API (line-wrapped).
pub fn decode_content(encoded: &str) -> EngineResult<Vec<u8>> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| EngineError::MalformedDocument(format!("invalid base64 content: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    use crate::cfr::config::EngineConfig;
    use crate::cfr::engine::RegretEngine;

    /// One request as seen by the loopback server.
    struct Recorded {
        request_line: String,
        headers: Vec<(String, String)>,
        body: String,
    }

    impl Recorded {
        fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str())
        }
    }

    /// Serve one scripted `(status, body)` reply per connection on loopback.
    ///
    /// Returns the base URL and a handle yielding every recorded request.
    fn serve(replies: Vec<(u16, String)>) -> (String, JoinHandle<Vec<Recorded>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let handle = std::thread::spawn(move || {
            let mut recorded = Vec::new();
            for (status, reply) in replies {
                let (mut stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());

                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();
                let mut headers = Vec::new();
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).unwrap();
                    let line = line.trim_end();
                    if line.is_empty() {
                        break;
                    }
                    if let Some((key, value)) = line.split_once(':') {
                        headers.push((key.trim().to_string(), value.trim().to_string()));
                    }
                }
                let length = headers
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
                    .map(|(_, value)| value.parse::<usize>().unwrap())
                    .unwrap_or(0);
                let mut body = vec![0u8; length];
                reader.read_exact(&mut body).unwrap();

                let response = format!(
                    "HTTP/1.1 {} Scripted\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    reply.len(),
                    reply
                );
                stream.write_all(response.as_bytes()).unwrap();
                stream.flush().unwrap();

                recorded.push(Recorded {
                    request_line: request_line.trim_end().to_string(),
                    headers,
                    body: String::from_utf8(body).unwrap(),
                });
            }
            recorded
        });

        (base, handle)
    }

    /// Client pointed at `base`, with its token in a per-test variable.
    fn loopback_store(base: &str, token_env: &str, token: &str) -> GithubContents {
        std::env::set_var(token_env, token);
        let config = RemoteConfig::new("owner/repo")
            .with_api_base(base)
            .with_token_env(token_env)
            .with_timeout_secs(5);
        GithubContents::new(&config).unwrap()
    }

    #[test]
    fn test_decode_wrapped_content() {
        let encoded = STANDARD.encode(br#"{"regret_table":{}}"#);
        let (head, tail) = encoded.split_at(8);
        let wrapped = format!("{}\n{}\n", head, tail);
        assert_eq!(decode_content(&wrapped).unwrap(), br#"{"regret_table":{}}"#);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_content("not base64!"),
            Err(EngineError::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_upsert_request_omits_missing_sha() {
        let create = UpsertRequest {
            message: "m",
            content: "e30=".to_string(),
            sha: None,
        };
        let json = serde_json::to_value(&create).unwrap();
        assert!(json.get("sha").is_none());

        let update = UpsertRequest {
            message: "m",
            content: "e30=".to_string(),
            sha: Some("abc"),
        };
        assert_eq!(serde_json::to_value(&update).unwrap()["sha"], "abc");
    }

    #[test]
    fn test_client_requires_token() {
        let config = RemoteConfig::new("owner/repo")
            .with_token_env("OFC_REGRET_TEST_REMOTE_TOKEN_UNSET");
        assert!(matches!(
            GithubContents::new(&config),
            Err(EngineError::Configuration(_))
        ));
    }

    #[test]
    fn test_debug_redacts_token() {
        let store = loopback_store(
            "http://127.0.0.1:9",
            "OFC_REGRET_TEST_TOKEN_DEBUG",
            "s3cret-value",
        );
        let printed = format!("{:?}", store);
        assert!(!printed.contains("s3cret-value"), "{}", printed);
        assert!(printed.contains("<redacted>"));
        assert!(printed.contains("/repos/owner/repo/contents/"));
    }

    #[test]
    fn test_fetch_missing_document_is_none() {
        let (base, server) = serve(vec![(404, r#"{"message":"Not Found"}"#.to_string())]);
        let store = loopback_store(&base, "OFC_REGRET_TEST_TOKEN_FETCH_404", "t404");

        assert_eq!(store.fetch().unwrap(), None);

        let requests = server.join().unwrap();
        assert!(requests[0]
            .request_line
            .starts_with("GET /repos/owner/repo/contents/progress/ai_progress.json "));
    }

    #[test]
    fn test_fetch_decodes_content_and_sends_token() {
        let encoded = STANDARD.encode(br#"{"regret_table":{}}"#);
        let (head, tail) = encoded.split_at(6);
        let reply = format!(r#"{{"sha":"abc","content":"{}\n{}\n"}}"#, head, tail);
        let (base, server) = serve(vec![(200, reply)]);
        let store = loopback_store(&base, "OFC_REGRET_TEST_TOKEN_FETCH_OK", "tok-fetch");

        let document = store.fetch().unwrap().unwrap();
        assert_eq!(document.revision, "abc");
        assert_eq!(document.content, br#"{"regret_table":{}}"#);

        let requests = server.join().unwrap();
        assert_eq!(requests[0].header("authorization"), Some("token tok-fetch"));
        assert_eq!(
            requests[0].header("accept"),
            Some("application/vnd.github+json")
        );
        assert!(requests[0].header("user-agent").is_some());
    }

    #[test]
    fn test_fetch_server_error_is_status() {
        let (base, server) = serve(vec![(500, "boom".to_string())]);
        let store = loopback_store(&base, "OFC_REGRET_TEST_TOKEN_FETCH_500", "t500");

        match store.fetch() {
            Err(EngineError::Storage(StorageError::Status { status, body })) => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected status error, got {:?}", other),
        }
        server.join().unwrap();
    }

    #[test]
    fn test_upsert_sends_revision_and_returns_new_one() {
        let (base, server) = serve(vec![(201, r#"{"content":{"sha":"def"}}"#.to_string())]);
        let store = loopback_store(&base, "OFC_REGRET_TEST_TOKEN_UPSERT", "tok-put");

        let revision = store.upsert(b"{\"a\":1}", Some("abc")).unwrap();
        assert_eq!(revision.as_deref(), Some("def"));

        let requests = server.join().unwrap();
        let request = &requests[0];
        assert!(request.request_line.starts_with("PUT /repos/owner/repo/contents/"));
        assert_eq!(request.header("authorization"), Some("token tok-put"));

        let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(body["sha"], "abc");
        assert_eq!(body["message"], "Update AI progress");
        let content = decode_content(body["content"].as_str().unwrap()).unwrap();
        assert_eq!(content, b"{\"a\":1}");
    }

    #[test]
    fn test_upsert_conflict_is_status() {
        let (base, server) = serve(vec![(409, r#"{"message":"sha mismatch"}"#.to_string())]);
        let store = loopback_store(&base, "OFC_REGRET_TEST_TOKEN_UPSERT_409", "t409");

        assert!(matches!(
            store.upsert(b"{}", Some("stale")),
            Err(EngineError::Storage(StorageError::Status { status: 409, .. }))
        ));
        server.join().unwrap();
    }

    #[test]
    fn test_engine_creates_remote_document_without_sha() {
        let (base, server) = serve(vec![
            (404, r#"{"message":"Not Found"}"#.to_string()),
            (201, r#"{"content":{"sha":"first"}}"#.to_string()),
        ]);
        let store = loopback_store(&base, "OFC_REGRET_TEST_TOKEN_ENGINE", "t-engine");

        let mut engine = RegretEngine::new(EngineConfig::default().with_seed(3));
        engine.accumulate_regret("s", "top", 1.5);
        engine.persist_remote(&store).unwrap();

        let requests = server.join().unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].request_line.starts_with("GET "));
        assert!(requests[1].request_line.starts_with("PUT "));

        let body: serde_json::Value = serde_json::from_str(&requests[1].body).unwrap();
        assert!(body.get("sha").is_none());
        let content = decode_content(body["content"].as_str().unwrap()).unwrap();
        let mut restored = RegretEngine::new(EngineConfig::default());
        restored
            .restore_remote(&MemoryDocument(content))
            .unwrap();
        assert_eq!(restored.regret("s", "top"), Some(1.5));
    }

    /// Store that always serves one fixed document.
    struct MemoryDocument(Vec<u8>);

    impl ContentStore for MemoryDocument {
        fn fetch(&self) -> EngineResult<Option<RemoteDocument>> {
            Ok(Some(RemoteDocument {
                revision: "fixed".to_string(),
                content: self.0.clone(),
            }))
        }

        fn upsert(&self, _content: &[u8], _revision: Option<&str>) -> EngineResult<Option<String>> {
            Ok(None)
        }
    }
}
