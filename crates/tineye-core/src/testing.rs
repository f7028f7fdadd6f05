//! Test doubles for the transport seam.

use crate::error::Result;
use crate::transport::{ApiRequest, RawReply, Transport};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

fn wire_method(request: &ApiRequest) -> String {
    request
        .url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

fn envelope(method: &str, status: &str, error: Vec<String>, result: Value) -> RawReply {
    RawReply {
        status: 200,
        body: json!({"status": status, "method": method, "error": error, "result": result})
            .to_string(),
    }
}

/// Records requests and replays queued replies.
///
/// With nothing queued it answers `ok` with an empty result.
#[derive(Default)]
pub(crate) struct MockTransport {
    replies: Mutex<VecDeque<RawReply>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn reply(&self, status: u16, body: &str) {
        self.replies.lock().unwrap().push_back(RawReply {
            status,
            body: body.to_string(),
        });
    }

    pub(crate) fn reply_json(&self, body: Value) {
        self.reply(200, &body.to_string());
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn last_request(&self) -> ApiRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: ApiRequest) -> Result<RawReply> {
        let method = wire_method(&request);
        self.requests.lock().unwrap().push(request);
        let queued = self.replies.lock().unwrap().pop_front();
        Ok(queued.unwrap_or_else(|| envelope(&method, "ok", vec![], json!([]))))
    }
}

struct StoredImage {
    filepath: String,
    data: Vec<u8>,
}

/// In-memory stand-in for a match engine's collection.
///
/// Understands `add`, `list`, `count`, `delete`, `search` and `ping` well
/// enough for round-trip tests: images are kept in insertion order, a search
/// with identical bytes scores 100, and URLs containing `404` fail to download.
#[derive(Default)]
pub(crate) struct FakeCollection {
    images: Mutex<Vec<StoredImage>>,
}

impl FakeCollection {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn seed(&self, filepaths: &[&str]) {
        let mut images = self.images.lock().unwrap();
        for filepath in filepaths {
            images.push(StoredImage {
                filepath: filepath.to_string(),
                data: Vec::new(),
            });
        }
    }

    fn add(&self, request: &ApiRequest) -> RawReply {
        let mut images = self.images.lock().unwrap();
        for i in 0.. {
            let field = format!("images[{i}]");
            let file = request.files.iter().find(|f| f.field == field);
            let filepath = request
                .params
                .get(&format!("filepaths[{i}]"))
                .map(str::to_string)
                .or_else(|| file.map(|f| f.file_name.clone()));
            let Some(filepath) = filepath else {
                break;
            };
            let data = file.map(|f| f.data.clone()).unwrap_or_default();
            match images.iter_mut().find(|img| img.filepath == filepath) {
                Some(existing) => existing.data = data,
                None => images.push(StoredImage { filepath, data }),
            }
        }
        envelope("add", "ok", vec![], json!([]))
    }

    fn list(&self, request: &ApiRequest) -> RawReply {
        let offset: usize = request.params.get("offset").and_then(|v| v.parse().ok()).unwrap_or(0);
        let limit: usize = request.params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(20);
        let images = self.images.lock().unwrap();
        let paths: Vec<&str> = images
            .iter()
            .skip(offset)
            .take(limit)
            .map(|img| img.filepath.as_str())
            .collect();
        envelope("list", "ok", vec![], json!(paths))
    }

    fn delete(&self, request: &ApiRequest) -> RawReply {
        let mut images = self.images.lock().unwrap();
        let mut errors = Vec::new();
        for (_, filepath) in request.params.pairs() {
            match images.iter().position(|img| &img.filepath == filepath) {
                Some(index) => {
                    images.remove(index);
                }
                None => errors.push(format!("{filepath}: Failed to remove from index.")),
            }
        }
        let status = if errors.is_empty() { "ok" } else { "warn" };
        envelope("delete", status, errors, json!([]))
    }

    fn search(&self, request: &ApiRequest) -> RawReply {
        if let Some(url) = request.params.get("url") {
            if url.contains("404") {
                return envelope(
                    "search",
                    "fail",
                    vec![format!("{url}: Failed to download file.")],
                    json!([]),
                );
            }
        }
        let images = self.images.lock().unwrap();
        let query = request.files.iter().find(|f| f.field == "image");
        let hits: Vec<Value> = images
            .iter()
            .filter(|img| match (query, request.params.get("filepath")) {
                (Some(file), _) => !img.data.is_empty() && img.data == file.data,
                (None, Some(filepath)) => img.filepath == filepath,
                _ => false,
            })
            .map(|img| {
                json!({
                    "filepath": img.filepath,
                    "score": "100.00",
                    "overlay": format!("overlay/?query=query.jpg&target={}", img.filepath),
                })
            })
            .collect();
        envelope("search", "ok", vec![], json!(hits))
    }
}

#[async_trait]
impl Transport for FakeCollection {
    async fn execute(&self, request: ApiRequest) -> Result<RawReply> {
        let reply = match wire_method(&request).as_str() {
            "add" => self.add(&request),
            "list" => self.list(&request),
            "delete" => self.delete(&request),
            "search" => self.search(&request),
            "count" => {
                let count = self.images.lock().unwrap().len();
                envelope("count", "ok", vec![], json!([count]))
            }
            other => envelope(other, "ok", vec![], json!([])),
        };
        Ok(reply)
    }
}
