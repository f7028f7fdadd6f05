//! HTTP transport.
//!
//! [`Transport`] is the one seam between the request-building layer and the
//! network. [`ReqwestTransport`] is the production implementation; anything
//! that can turn an [`ApiRequest`] into a status code and body text can stand
//! in for it.

use crate::config::Credentials;
use crate::error::{Result, TinEyeError};
use crate::params::{FilePart, Params};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::time::Duration;

/// HTTP verb chosen for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
        }
    }
}

/// A fully built request, ready to send.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// Full method URL, e.g. `http://localhost/rest/search/`
    pub url: String,
    pub params: Params,
    /// Binary attachments; non-empty means multipart POST
    pub files: Vec<FilePart>,
    pub credentials: Option<Credentials>,
    /// Effective timeout; `None` leaves the HTTP client's default
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    /// GET for parameter-only requests, POST when images are attached.
    pub fn http_method(&self) -> HttpMethod {
        if self.files.is_empty() {
            HttpMethod::Get
        } else {
            HttpMethod::Post
        }
    }
}

/// What came back over the wire, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReply {
    pub status: u16,
    pub body: String,
}

impl RawReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request and returns the raw reply.
///
/// Uses `async_trait` because clients hold an `Arc<dyn Transport>`.
/// Implementations must not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<RawReply>;
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuse an existing client (connection pool, proxies, TLS settings).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: ApiRequest) -> Result<RawReply> {
        let method = request.http_method();
        let url = request.url;

        let mut builder = match method {
            HttpMethod::Get => self.client.get(&url).query(request.params.pairs()),
            HttpMethod::Post => {
                // Field and file names go out as-is: the service expects
                // literal `images[0]` and collection filepaths with slashes.
                let mut form = Form::new().percent_encode_noop();
                for (key, value) in request.params.into_pairs() {
                    form = form.text(key, value);
                }
                for file in request.files {
                    form = form.part(file.field, Part::bytes(file.data).file_name(file.file_name));
                }
                self.client.post(&url).multipart(form)
            }
        };

        if let Some(credentials) = &request.credentials {
            builder = builder.basic_auth(&credentials.username, Some(&credentials.password));
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let resp = builder.send().await.map_err(|e| TinEyeError::Request {
            url: url.clone(),
            message: e.to_string(),
        })?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| TinEyeError::Request {
            url: url.clone(),
            message: format!("failed to read response body: {e}"),
        })?;

        Ok(RawReply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and hand back the raw request text.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
                if request_complete(&received) {
                    break;
                }
            }
            let reply = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&received).into_owned()
        });
        (format!("http://{addr}/rest/"), handle)
    }

    /// Headers received and, if announced, the whole body.
    fn request_complete(received: &[u8]) -> bool {
        let text = String::from_utf8_lossy(received);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        if text[..header_end]
            .to_ascii_lowercase()
            .contains("transfer-encoding: chunked")
        {
            return text.ends_with("0\r\n\r\n");
        }
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        received.len() >= header_end + 4 + content_length
    }

    fn request(url: String, params: Params, files: Vec<FilePart>) -> ApiRequest {
        ApiRequest {
            url,
            params,
            files,
            credentials: None,
            timeout: Some(Duration::from_secs(5)),
        }
    }

    #[test]
    fn test_http_method_selection() {
        let mut req = request("http://x/rest/list/".into(), Params::new(), vec![]);
        assert_eq!(req.http_method(), HttpMethod::Get);
        req.files.push(FilePart::new("image", "a.jpg", &[1]));
        assert_eq!(req.http_method(), HttpMethod::Post);
    }

    #[tokio::test]
    async fn test_get_sends_indexed_query() {
        let (base, server) = serve_once("200 OK", r#"{"status":"ok"}"#).await;
        let mut params = Params::new();
        params.insert_indexed("filepaths", &["a.jpg", "b.jpg"]);

        let mut req = request(format!("{base}delete/"), params, vec![]);
        req.credentials = Some(Credentials {
            username: "user".to_string(),
            password: "pass".to_string(),
        });
        let reply = ReqwestTransport::new().execute(req).await.unwrap();
        assert_eq!(reply.status, 200);
        assert!(reply.is_success());
        assert_eq!(reply.body, r#"{"status":"ok"}"#);

        let received = server.await.unwrap();
        let request_line = received.lines().next().unwrap();
        assert!(request_line.starts_with("GET /rest/delete/?"));
        assert!(request_line.contains("filepaths%5B0%5D=a.jpg&filepaths%5B1%5D=b.jpg"));
        // "user:pass" in base64
        assert!(received.contains("dXNlcjpwYXNz"));
    }

    #[tokio::test]
    async fn test_post_sends_multipart() {
        let (base, server) = serve_once("200 OK", r#"{"status":"ok"}"#).await;
        let mut params = Params::new();
        params.insert("filepaths[0]", "folder/banana.jpg");
        let files = vec![FilePart::new("images[0]", "1700000000.0", b"JPEGDATA")];

        let reply = ReqwestTransport::new()
            .execute(request(format!("{base}add/"), params, files))
            .await
            .unwrap();
        assert!(reply.is_success());

        let received = server.await.unwrap();
        assert!(received.starts_with("POST /rest/add/ "));
        assert!(received.contains("multipart/form-data; boundary="));
        assert!(received.contains(r#"name="filepaths[0]""#));
        assert!(received.contains("folder/banana.jpg"));
        assert!(received.contains(r#"name="images[0]"; filename="1700000000.0""#));
        assert!(received.contains("JPEGDATA"));
    }

    #[tokio::test]
    async fn test_error_status_is_returned_raw() {
        let (base, server) = serve_once("500 Internal Server Error", "boom").await;
        let reply = ReqwestTransport::new()
            .execute(request(format!("{base}ping/"), Params::new(), vec![]))
            .await
            .unwrap();
        assert_eq!(reply.status, 500);
        assert!(!reply.is_success());
        assert_eq!(reply.body, "boom");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_refused_is_request_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = ReqwestTransport::new()
            .execute(request(format!("http://{addr}/rest/ping/"), Params::new(), vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, TinEyeError::Request { .. }));
    }
}
