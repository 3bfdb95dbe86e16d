// Shared test plumbing: a local HTTP server started on a background
// thread (the crate's clients are blocking, so the tests stay plain
// `#[test]` functions) and a mock of the VK method surface with
// per-endpoint hit counters.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::mpsc;

use axum::Router;

/// Bind on an ephemeral port, hand the bound address to the app builder
/// (mock bodies often need to reference their own server), and serve on
/// a dedicated runtime until the test process exits.
pub fn start_server<F>(make_app: F) -> SocketAddr
where
    F: FnOnce(SocketAddr) -> Router + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
        rt.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tx.send(addr).unwrap();
            axum::serve(listener, make_app(addr)).await.unwrap();
        });
    });
    rx.recv().expect("mock server did not start")
}

pub mod vk_mock {
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex, OnceLock};

    use axum::extract::{Query, State};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    /// Which protocol step answers with an in-band error body.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Fail {
        Nowhere,
        UploadServer,
        Upload,
        Save,
        Post,
    }

    /// One mock VK instance: counts every endpoint hit and captures the
    /// query parameters of the save and post calls for assertions.
    pub struct VkMock {
        fail: Fail,
        addr: OnceLock<SocketAddr>,
        pub upload_server_hits: AtomicUsize,
        pub upload_hits: AtomicUsize,
        pub save_hits: AtomicUsize,
        pub post_hits: AtomicUsize,
        pub save_query: Mutex<Option<HashMap<String, String>>>,
        pub post_query: Mutex<Option<HashMap<String, String>>>,
    }

    impl VkMock {
        pub fn new(fail: Fail) -> Arc<Self> {
            Arc::new(VkMock {
                fail,
                addr: OnceLock::new(),
                upload_server_hits: AtomicUsize::new(0),
                upload_hits: AtomicUsize::new(0),
                save_hits: AtomicUsize::new(0),
                post_hits: AtomicUsize::new(0),
                save_query: Mutex::new(None),
                post_query: Mutex::new(None),
            })
        }

        pub fn set_addr(&self, addr: SocketAddr) {
            self.addr.set(addr).expect("addr set twice");
        }

        fn addr(&self) -> SocketAddr {
            *self.addr.get().expect("addr not set")
        }

        pub fn hits(&self) -> (usize, usize, usize, usize) {
            (
                self.upload_server_hits.load(Ordering::SeqCst),
                self.upload_hits.load(Ordering::SeqCst),
                self.save_hits.load(Ordering::SeqCst),
                self.post_hits.load(Ordering::SeqCst),
            )
        }
    }

    /// Routes matching the slice of the VK surface the client touches.
    /// The client's base URL should be `http://{addr}/method`.
    pub fn router(mock: Arc<VkMock>) -> Router {
        Router::new()
            .route("/method/photos.getWallUploadServer", get(upload_server))
            .route("/upload", post(upload))
            .route("/method/photos.saveWallPhoto", post(save))
            .route("/method/wall.post", post(wall_post))
            .with_state(mock)
    }

    fn in_band_error() -> Json<Value> {
        Json(json!({"error": {"error_code": 100, "error_msg": "mock failure"}}))
    }

    async fn upload_server(State(mock): State<Arc<VkMock>>) -> Json<Value> {
        mock.upload_server_hits.fetch_add(1, Ordering::SeqCst);
        if mock.fail == Fail::UploadServer {
            return in_band_error();
        }
        Json(json!({
            "response": {"upload_url": format!("http://{}/upload", mock.addr())}
        }))
    }

    async fn upload(State(mock): State<Arc<VkMock>>) -> Json<Value> {
        mock.upload_hits.fetch_add(1, Ordering::SeqCst);
        if mock.fail == Fail::Upload {
            return in_band_error();
        }
        Json(json!({"server": 884412, "photo": "[]", "hash": "abc123"}))
    }

    async fn save(
        State(mock): State<Arc<VkMock>>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Json<Value> {
        mock.save_hits.fetch_add(1, Ordering::SeqCst);
        *mock.save_query.lock().unwrap() = Some(params);
        if mock.fail == Fail::Save {
            return in_band_error();
        }
        Json(json!({"response": [{"owner_id": -123, "id": 456}]}))
    }

    async fn wall_post(
        State(mock): State<Arc<VkMock>>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Json<Value> {
        mock.post_hits.fetch_add(1, Ordering::SeqCst);
        *mock.post_query.lock().unwrap() = Some(params);
        if mock.fail == Fail::Post {
            return in_band_error();
        }
        Json(json!({"response": {"post_id": 789}}))
    }
}
