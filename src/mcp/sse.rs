//! SSE transport (MCP HTTP+SSE, protocol 2024-11-05)
//!
//! - `GET /sse` opens an event stream. The first event is `endpoint`, whose
//!   data is the URL the client must POST its messages to.
//! - `POST /messages?session_id=<id>` takes one JSON-RPC message and answers
//!   `202 Accepted`; the JSON-RPC reply arrives on the stream as a `message` event.
//! - `GET /health` answers `ok`.

use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full, Limited, StreamBody};
use hyper::body::{Bytes, Frame, Incoming};
use hyper::header::{HeaderValue, ALLOW, CACHE_CONTROL, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::server::McpServer;

/// Maximum JSON-RPC message size accepted on POST (4MB)
const MAX_BODY_SIZE: usize = 4 * 1024 * 1024;

/// Events buffered per session before POST handlers wait
const SESSION_BUFFER: usize = 64;

pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(15);

pub const SSE_PATH: &str = "/sse";
pub const MESSAGES_PATH: &str = "/messages";

type SseBody = UnsyncBoxBody<Bytes, Infallible>;
type Sessions = Arc<RwLock<HashMap<String, mpsc::Sender<String>>>>;

/// Format one SSE event; multi-line data is split over several `data:` fields
pub fn format_event(event: &str, data: &str) -> String {
    let mut out = format!("event: {}\n", event);
    for line in data.split('\n') {
        out.push_str("data: ");
        out.push_str(line.trim_end_matches('\r'));
        out.push('\n');
    }
    out.push('\n');
    out
}

/// Extract a query parameter value
pub fn query_param(query: Option<&str>, key: &str) -> Option<String> {
    query?.split('&').find_map(|param| {
        let mut parts = param.splitn(2, '=');
        if parts.next()? == key {
            Some(parts.next().unwrap_or_default().to_string())
        } else {
            None
        }
    })
}

/// SSE MCP server
pub struct SseServer {
    mcp: McpServer,
    sessions: Sessions,
    keep_alive: Duration,
}

impl SseServer {
    pub fn new(mcp: McpServer) -> Self {
        Self {
            mcp,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            keep_alive: DEFAULT_KEEP_ALIVE,
        }
    }

    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Bind `addr` and serve until `shutdown` resolves
    pub async fn run<F>(self: Arc<Self>, addr: SocketAddr, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| anyhow!("Failed to bind {}: {}", addr, e))?;
        info!(
            "MCP SSE server listening on http://{}{}",
            listener.local_addr()?,
            SSE_PATH
        );
        self.serve(listener, shutdown).await
    }

    /// Accept connections on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self: Arc<Self>, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        tokio::pin!(shutdown);

        loop {
            let (stream, peer) = tokio::select! {
                _ = &mut shutdown => {
                    info!("SSE server shutting down");
                    return Ok(());
                }
                conn = listener.accept() => match conn {
                    Ok(conn) => conn,
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                        continue;
                    }
                },
            };

            debug!("Connection from {}", peer);
            let io = TokioIo::new(stream);
            let this = self.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req| this.clone().handle(req));
                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    if !e.to_string().contains("connection closed") {
                        error!("Error serving connection: {}", e);
                    }
                }
            });
        }
    }

    async fn handle(self: Arc<Self>, req: Request<Incoming>) -> Result<Response<SseBody>, Infallible> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        let response = match (method, path.as_str()) {
            (Method::GET, SSE_PATH) => self.open_stream().await,
            (Method::POST, MESSAGES_PATH) => self.post_message(req).await,
            (Method::GET, "/health") => text_response(StatusCode::OK, "ok"),
            (Method::OPTIONS, SSE_PATH | MESSAGES_PATH) => {
                let mut resp = empty_response(StatusCode::NO_CONTENT);
                resp.headers_mut()
                    .insert(ALLOW, HeaderValue::from_static("GET, POST, OPTIONS"));
                resp
            }
            (_, SSE_PATH | MESSAGES_PATH) => {
                text_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
            }
            _ => text_response(StatusCode::NOT_FOUND, "Not Found"),
        };

        Ok(response)
    }

    /// Register a session and return its event stream
    async fn open_stream(&self) -> Response<SseBody> {
        let session_id = Uuid::new_v4().simple().to_string();
        let (tx, rx) = mpsc::channel::<String>(SESSION_BUFFER);

        let endpoint = format!("{}?session_id={}", MESSAGES_PATH, session_id);
        if tx.send(format_event("endpoint", &endpoint)).await.is_err() {
            return text_response(StatusCode::INTERNAL_SERVER_ERROR, "Stream closed");
        }

        self.sessions
            .write()
            .await
            .insert(session_id.clone(), tx.clone());
        info!("SSE session {} opened", session_id);

        tokio::spawn(keep_alive(
            self.sessions.clone(),
            session_id,
            tx,
            self.keep_alive,
        ));

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv()
                .await
                .map(|chunk| (Ok::<_, Infallible>(Frame::data(Bytes::from(chunk))), rx))
        });

        let mut resp = Response::new(StreamBody::new(stream).boxed_unsync());
        let headers = resp.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert("X-Accel-Buffering", HeaderValue::from_static("no"));
        resp
    }

    async fn post_message(&self, req: Request<Incoming>) -> Response<SseBody> {
        let query = req.uri().query().map(|q| q.to_string());
        let session_id = match query_param(query.as_deref(), "session_id")
            .or_else(|| query_param(query.as_deref(), "sessionId"))
            .filter(|id| !id.is_empty())
        {
            Some(id) => id,
            None => return text_response(StatusCode::BAD_REQUEST, "session_id is required"),
        };

        let sender = match self.sessions.read().await.get(&session_id) {
            Some(tx) => tx.clone(),
            None => return text_response(StatusCode::NOT_FOUND, "Session not found"),
        };

        let body = match read_body_with_limit(req, MAX_BODY_SIZE).await {
            Ok(body) => body,
            Err(e) => return text_response(StatusCode::BAD_REQUEST, &e),
        };
        let message = match String::from_utf8(body.to_vec()) {
            Ok(m) => m,
            Err(_) => return text_response(StatusCode::BAD_REQUEST, "Body is not valid UTF-8"),
        };

        let mcp = self.mcp.clone();
        tokio::spawn(async move {
            if let Some(reply) = mcp.handle_message(&message).await {
                if sender.send(format_event("message", &reply)).await.is_err() {
                    warn!("SSE session {} closed before reply was delivered", session_id);
                }
            }
        });

        text_response(StatusCode::ACCEPTED, "Accepted")
    }
}

/// Send comment frames until the client goes away, then drop the session
async fn keep_alive(
    sessions: Sessions,
    session_id: String,
    tx: mpsc::Sender<String>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = tx.closed() => break,
            _ = ticker.tick() => {
                if tx.send(": keep-alive\n\n".to_string()).await.is_err() {
                    break;
                }
            }
        }
    }

    sessions.write().await.remove(&session_id);
    info!("SSE session {} closed", session_id);
}

async fn read_body_with_limit(req: Request<Incoming>, max_size: usize) -> Result<Bytes, String> {
    let limited = Limited::new(req.into_body(), max_size);
    match limited.collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) => {
            if e.to_string().contains("length limit exceeded") {
                Err(format!("Request body too large (max {} bytes)", max_size))
            } else {
                Err("Failed to read body".to_string())
            }
        }
    }
}

fn empty_response(status: StatusCode) -> Response<SseBody> {
    let mut resp = Response::new(Full::new(Bytes::new()).boxed_unsync());
    *resp.status_mut() = status;
    resp
}

fn text_response(status: StatusCode, text: &str) -> Response<SseBody> {
    let mut resp = Response::new(Full::new(Bytes::from(text.to_string())).boxed_unsync());
    *resp.status_mut() = status;
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    resp
}
