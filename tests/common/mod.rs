//! Test helpers for integration tests.
//!
//! Provides a local HTTP server that plays both sides of feedwatch's network
//! traffic: it serves scripted feed responses and records the notification
//! forms posted to it.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;

use feedwatch::cache::CacheStore;
use feedwatch::diff::DiffEngine;
use feedwatch::fetch::Downloader;
use feedwatch::template::MessageTemplates;
use feedwatch::{Context, Dispatcher, Notifier};

/// Default timeout for test operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Bot id used by test Telegram notifiers.
pub const TEST_BOT: &str = "testbot";

/// Chat id used by test Telegram notifiers.
pub const TEST_CHAT: &str = "4242";

/// A scripted answer to a feed request.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    /// A 429 asking the client to wait `retry_after` (Go duration syntax).
    pub fn rate_limited(retry_after: &str) -> Self {
        Self::status(429).with_header("X-Ratelimit-Retryafter", retry_after)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// A form posted to the server.
#[derive(Debug, Clone)]
pub struct RecordedPost {
    pub path: String,
    pub form: HashMap<String, String>,
}

impl RecordedPost {
    pub fn field(&self, name: &str) -> &str {
        self.form.get(name).map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug)]
struct MockState {
    queue: Mutex<VecDeque<Reply>>,
    fallback: Mutex<Reply>,
    post_status: Mutex<u16>,
    posts: Mutex<Vec<RecordedPost>>,
    feed_requests: AtomicUsize,
}

/// Local HTTP server for feed and notifier traffic.
pub struct MockServer {
    addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockServer {
    /// Start a server on an ephemeral port.
    ///
    /// GET requests pop the next queued reply, or get the fallback reply
    /// once the queue is empty. POST requests are recorded as forms.
    pub async fn start() -> Self {
        let state = Arc::new(MockState {
            queue: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(Reply::status(404)),
            post_status: Mutex::new(200),
            posts: Mutex::new(Vec::new()),
            feed_requests: AtomicUsize::new(0),
        });

        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock server");
        let addr = listener.local_addr().expect("Failed to get local address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self { addr, state }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Absolute URL for `path` on this server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Queue a reply for the next feed request.
    pub fn push_reply(&self, reply: Reply) {
        self.state.queue.lock().unwrap().push_back(reply);
    }

    /// Reply used once the queue is drained.
    pub fn set_fallback(&self, reply: Reply) {
        *self.state.fallback.lock().unwrap() = reply;
    }

    /// Serve `body` with 200 for every following feed request.
    pub fn serve_feed(&self, body: impl Into<String>) {
        self.set_fallback(Reply::ok(body));
    }

    /// Status answered to notification posts.
    pub fn set_post_status(&self, status: u16) {
        *self.state.post_status.lock().unwrap() = status;
    }

    pub fn posts(&self) -> Vec<RecordedPost> {
        self.state.posts.lock().unwrap().clone()
    }

    pub fn clear_posts(&self) {
        self.state.posts.lock().unwrap().clear();
    }

    pub fn feed_requests(&self) -> usize {
        self.state.feed_requests.load(Ordering::SeqCst)
    }

    /// A Telegram notifier pointed at this server.
    pub fn telegram(&self) -> Notifier {
        Notifier::parse(&format!("telegram:{}#{}", TEST_BOT, TEST_CHAT))
            .unwrap()
            .with_endpoint(self.url(""))
    }

    /// A Pushover notifier pointed at this server.
    pub fn pushover(&self) -> Notifier {
        Notifier::parse("pushover:apptoken:userkey")
            .unwrap()
            .with_endpoint(self.url("/1/messages.json"))
    }

    /// Path Telegram notices are posted to.
    pub fn telegram_path(&self) -> String {
        format!("/bot{}/sendMessage", TEST_BOT)
    }
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    body: String,
) -> Response {
    if method == Method::POST {
        let form = url::form_urlencoded::parse(body.as_bytes())
            .into_owned()
            .collect();
        state.posts.lock().unwrap().push(RecordedPost {
            path: uri.path().to_string(),
            form,
        });
        let status = *state.post_status.lock().unwrap();
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::OK);
        return (status, r#"{"status":1,"ok":true}"#).into_response();
    }

    state.feed_requests.fetch_add(1, Ordering::SeqCst);
    let reply = {
        let mut queue = state.queue.lock().unwrap();
        queue
            .pop_front()
            .unwrap_or_else(|| state.fallback.lock().unwrap().clone())
    };

    let mut builder = Response::builder().status(reply.status);
    for (name, value) in &reply.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
        .body(Body::from(reply.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// RSS 2.0 document with one item per guid.
pub fn rss(guids: &[&str]) -> String {
    let items: String = guids
        .iter()
        .map(|guid| {
            format!(
                "<item><title>Item {guid}</title><link>https://example.com/items/{guid}</link>\
                 <description>Body of item {guid}</description><guid>{guid}</guid></item>"
            )
        })
        .collect();

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <rss version=\"2.0\"><channel><title>Test Feed</title>\
         <link>https://example.com/</link><description>Test</description>\
         {items}</channel></rss>"
    )
}

/// A context that caches under `working_dir` and notifies through `notifiers`.
pub fn test_context(working_dir: &Path, notifiers: Vec<Notifier>) -> Context {
    let downloader = Downloader::new().expect("Failed to create downloader");
    let dispatcher = Dispatcher::new(
        downloader.client().clone(),
        notifiers,
        MessageTemplates::new(),
    );
    Context::new(
        CacheStore::new(working_dir),
        downloader,
        DiffEngine::new(None),
        dispatcher,
    )
}

/// Poll `condition` until it holds or [`DEFAULT_TIMEOUT`] passes.
pub async fn wait_until<F>(mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + DEFAULT_TIMEOUT;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    condition()
}
