//! JSON-RPC over HTTP adapters for the service traits.
//!
//! - [`hub`]: thread database gateway
//! - [`pow`]: storage network file staging
//! - [`space`]: local file-sharing daemon

pub mod hub;
pub mod pow;
pub mod rpc;
pub mod space;

pub use hub::HubConnector;
pub use pow::PowConnector;
pub use space::SpaceConnector;

/// Scripted HTTP stub used by the adapter tests.
#[cfg(test)]
pub(crate) mod stub {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use axum::body::Bytes;
    use axum::extract::State;
    use axum::http::{header, HeaderMap, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::Router;
    use tokio::net::TcpListener;
    use tokio::sync::Notify;
    use tokio::task::JoinHandle;

    /// A request as the stub saw it.
    #[derive(Debug)]
    pub struct Seen {
        /// `name: value` lines; names are lowercase.
        pub headers: Vec<String>,
        pub body: serde_json::Value,
    }

    #[derive(Default)]
    struct Script {
        replies: VecDeque<(u16, String)>,
        seen: Vec<Seen>,
    }

    #[derive(Clone)]
    struct StubState {
        script: Arc<Mutex<Script>>,
        served: Arc<Notify>,
    }

    async fn reply(State(state): State<StubState>, headers: HeaderMap, body: Bytes) -> Response {
        let next = {
            let mut script = state.script.lock().expect("script lock");
            script.seen.push(Seen {
                headers: headers
                    .iter()
                    .map(|(name, value)| {
                        format!("{}: {}", name.as_str(), value.to_str().expect("ascii header"))
                    })
                    .collect(),
                body: serde_json::from_slice(&body).expect("json body"),
            });
            script.replies.pop_front()
        };
        state.served.notify_one();

        match next {
            Some((status, body)) => (
                StatusCode::from_u16(status).expect("status"),
                [(header::CONTENT_TYPE, "application/json")],
                body,
            )
                .into_response(),
            None => (StatusCode::INTERNAL_SERVER_ERROR, "stub script exhausted").into_response(),
        }
    }

    /// Serve `replies` (status, body) to consecutive requests on any path.
    /// The handle resolves to the requests seen once every reply was used.
    pub async fn serve(replies: Vec<(u16, String)>) -> (String, JoinHandle<Vec<Seen>>) {
        let expected = replies.len();
        let state = StubState {
            script: Arc::new(Mutex::new(Script {
                replies: replies.into(),
                seen: Vec::new(),
            })),
            served: Arc::new(Notify::new()),
        };

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let host = format!("http://{}", listener.local_addr().expect("addr"));
        let router = Router::new().fallback(reply).with_state(state.clone());
        let server = tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve");
        });

        let handle = tokio::spawn(async move {
            loop {
                let served = state.served.notified();
                if state.script.lock().expect("script lock").seen.len() >= expected {
                    break;
                }
                served.await;
            }
            server.abort();
            let mut script = state.script.lock().expect("script lock");
            std::mem::take(&mut script.seen)
        });

        (host, handle)
    }

    /// JSON-RPC success body.
    pub fn ok(result: serde_json::Value) -> (u16, String) {
        (
            200,
            serde_json::json!({"jsonrpc": "2.0", "id": 1, "result": result}).to_string(),
        )
    }

    /// JSON-RPC error body.
    pub fn rpc_error(code: i64, message: &str) -> (u16, String) {
        (
            200,
            serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": {"code": code, "message": message}
            })
            .to_string(),
        )
    }
}
