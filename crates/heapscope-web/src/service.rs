use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use heapscope_graph::to_layout;
use heapscope_types::{Graph, HistoryItem, HistoryLabel, Request};
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::sync::{Notify, mpsc};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::error::RequestError;
use crate::{History, HistoryError, PublishError, PublisherConfig, protocol};

/// Title of graphs published without a label or explicit title.
pub const UNTITLED: &str = "untitled";

/// How long an evicted client's writer may take to flush its close frame.
const EVICTION_GRACE: Duration = Duration::from_secs(1);

// ── Publisher (caller side) ─────────────────────────────────────

/// Handle held by the synchronous caller.
///
/// Every method returns without waiting on the network: outgoing messages
/// go through an unbounded queue drained by the service thread. A slow or
/// absent client therefore costs memory, never caller latency.
pub struct Publisher {
    history: Arc<Mutex<History>>,
    outbound: mpsc::UnboundedSender<String>,
    local_addr: SocketAddr,
}

impl Publisher {
    /// Binds the listener, then spawns the service thread. Bind failures are
    /// reported here rather than from the background thread.
    pub fn start(config: PublisherConfig) -> Result<Self, PublishError> {
        let addr = config.listen_addr;
        let bind_error = |e: std::io::Error| PublishError::Bind {
            addr: addr.clone(),
            reason: e.to_string(),
        };
        let listener = std::net::TcpListener::bind(&addr).map_err(bind_error)?;
        listener.set_nonblocking(true).map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| PublishError::Runtime {
                reason: e.to_string(),
            })?;

        let history = Arc::new(Mutex::new(History::new()));
        let (outbound, queue) = mpsc::unbounded_channel();
        let state = Arc::new(ServiceState {
            history: Arc::clone(&history),
            client: ClientSlot::default(),
            next_conn_id: AtomicU64::new(1),
        });

        std::thread::Builder::new()
            .name("heapscope-publisher".to_string())
            .spawn(move || runtime.block_on(serve(listener, state, queue)))
            .map_err(|e| PublishError::Runtime {
                reason: e.to_string(),
            })?;

        info!(%local_addr, "publication service listening");
        Ok(Self {
            history,
            outbound,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Publishes `graph`. With a label, the graph is also remembered in
    /// history and its index is returned.
    pub fn publish(&self, graph: Graph, label: Option<HistoryLabel>) -> Option<usize> {
        match label {
            Some(label) => Some(self.publish_labeled(graph, label)),
            None => {
                self.publish_titled(UNTITLED, &graph);
                None
            }
        }
    }

    /// Remembers `graph` under `label` and pushes it titled `#<index>`,
    /// together with the refreshed history listing.
    pub fn publish_labeled(&self, graph: Graph, label: HistoryLabel) -> usize {
        let layout = to_layout(&graph);
        let (index, listing) = {
            let mut history = self.history.lock();
            let index = history.add(label, graph);
            (index, history.listing())
        };
        self.enqueue(protocol::graph_message(
            &format!("#{index}"),
            layout,
            Some(listing),
        ));
        index
    }

    /// Pushes `graph` without remembering it.
    pub fn publish_titled(&self, title: &str, graph: &Graph) {
        self.enqueue(protocol::graph_message(title, to_layout(graph), None));
    }

    /// Absolute index and graph of a history entry.
    pub fn snapshot(&self, index: i64) -> Result<(usize, Arc<Graph>), HistoryError> {
        let history = self.history.lock();
        let absolute = history.resolve(index)?;
        Ok((absolute, Arc::clone(&history.at(index)?.graph)))
    }

    pub fn history_listing(&self) -> Vec<HistoryItem> {
        self.history.lock().listing()
    }

    pub fn history_len(&self) -> usize {
        self.history.lock().len()
    }

    fn enqueue(&self, message: Result<String, RequestError>) {
        let text = match message {
            Ok(text) => text,
            Err(e) => {
                error!(%e, "dropping unencodable message");
                return;
            }
        };
        if self.outbound.send(text).is_err() {
            warn!("publication service is gone, dropping message");
        }
    }
}

// ── Service (event loop side) ───────────────────────────────────

struct ServiceState {
    history: Arc<Mutex<History>>,
    client: ClientSlot,
    next_conn_id: AtomicU64,
}

async fn serve(
    listener: std::net::TcpListener,
    state: Arc<ServiceState>,
    queue: mpsc::UnboundedReceiver<String>,
) {
    let listener = match TcpListener::from_std(listener) {
        Ok(listener) => listener,
        Err(e) => {
            error!(%e, "failed to register listener with the runtime");
            return;
        }
    };

    tokio::spawn(forward_outbound(queue, Arc::clone(&state)));

    let app = Router::new()
        .route("/", get(ws_upgrade))
        .route("/ws", get(ws_upgrade))
        .with_state(state);
    if let Err(e) = axum::serve(listener, app).await {
        error!(%e, "websocket server error");
    }
}

/// Drains the outbound queue into whichever client is current.
async fn forward_outbound(mut queue: mpsc::UnboundedReceiver<String>, state: Arc<ServiceState>) {
    while let Some(text) = queue.recv().await {
        state.client.send(text);
    }
    debug!("outbound queue closed");
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<ServiceState>>) -> Response {
    ws.on_upgrade(move |socket| handle_client(socket, state))
}

async fn handle_client(socket: WebSocket, state: Arc<ServiceState>) {
    let conn_id = state.next_conn_id.fetch_add(1, Ordering::Relaxed);
    let (sink, mut stream) = socket.split();
    let (outbox, pending) = mpsc::unbounded_channel();
    let mut writer = tokio::spawn(write_client(conn_id, sink, pending));
    let evicted = Arc::new(Notify::new());
    state.client.install(Client {
        conn_id,
        outbox,
        evicted: Arc::clone(&evicted),
    });
    info!(conn_id, "client connected");

    loop {
        let message = tokio::select! {
            _ = evicted.notified() => {
                info!(conn_id, "client superseded by a newer connection");
                if timeout(EVICTION_GRACE, &mut writer).await.is_err() {
                    debug!(conn_id, "evicted client is not draining, dropping its connection");
                    writer.abort();
                }
                return;
            }
            message = stream.next() => message,
        };
        match message {
            Some(Ok(Message::Text(text))) => state.handle_request(conn_id, text.as_str()),
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                warn!(conn_id, %e, "client transport failure");
                break;
            }
        }
    }

    state.client.release(conn_id);
    info!(conn_id, "client disconnected");
}

/// Owns the write half of one connection. Stops on the first failed send or
/// after a close frame; once the sender is dropped it closes the socket.
async fn write_client(
    conn_id: u64,
    mut sink: SplitSink<WebSocket, Message>,
    mut pending: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(message) = pending.recv().await {
        let closing = matches!(message, Message::Close(_));
        let sent = sink.send(message).await;
        if let Err(e) = sent {
            warn!(conn_id, %e, "client transport failure on send");
            return;
        }
        if closing {
            return;
        }
    }
    if let Err(e) = sink.close().await {
        debug!(conn_id, %e, "closing client connection failed");
    }
}

impl ServiceState {
    fn handle_request(&self, conn_id: u64, text: &str) {
        let request = match Request::decode(text) {
            Ok(request) => request,
            Err(e) => {
                warn!(conn_id, %e, "ignoring malformed request");
                return;
            }
        };
        debug!(conn_id, ?request, "handling request");
        match self.answer(request) {
            Ok(reply) => self.client.reply(conn_id, reply),
            Err(e) => warn!(conn_id, ?request, %e, "request failed"),
        }
    }

    fn answer(&self, request: Request) -> Result<String, RequestError> {
        match request {
            Request::History => protocol::history_message(self.history.lock().listing()),
            Request::Graph { index } => {
                let (absolute, graph) = {
                    let history = self.history.lock();
                    let absolute = history.resolve(index)?;
                    (absolute, Arc::clone(&history.at(index)?.graph))
                };
                protocol::graph_message(&format!("#{absolute}"), to_layout(&graph), None)
            }
        }
    }
}

// ── Client slot ─────────────────────────────────────────────────

struct Client {
    conn_id: u64,
    /// Feeds the connection's writer task.
    outbox: mpsc::UnboundedSender<Message>,
    /// Wakes the connection's read loop once it has been replaced.
    evicted: Arc<Notify>,
}

impl Client {
    fn evict(self) {
        info!(conn_id = self.conn_id, "evicting previous client");
        if self.outbox.send(Message::Close(None)).is_err() {
            debug!(conn_id = self.conn_id, "evicted client writer already gone");
        }
        self.evicted.notify_one();
    }
}

/// The zero-or-one connected client. Last connect wins.
///
/// The lock only guards the slot itself; socket I/O happens in each
/// connection's writer task, so a stalled client never holds it.
#[derive(Default)]
struct ClientSlot {
    current: Mutex<Option<Client>>,
}

impl ClientSlot {
    fn install(&self, client: Client) {
        let previous = self.current.lock().replace(client);
        if let Some(previous) = previous {
            previous.evict();
        }
    }

    /// Queues `text` for the current client, clearing the slot if its
    /// writer has stopped.
    fn send(&self, text: String) {
        let mut current = self.current.lock();
        let Some(client) = current.as_ref() else {
            debug!("no client attached, dropping message");
            return;
        };
        if client.outbox.send(Message::Text(text.into())).is_err() {
            warn!(conn_id = client.conn_id, "client writer is gone, detaching client");
            *current = None;
        }
    }

    /// Like [`send`](Self::send), but only if `conn_id` is still current.
    fn reply(&self, conn_id: u64, text: String) {
        let mut current = self.current.lock();
        let Some(client) = current.as_ref().filter(|client| client.conn_id == conn_id) else {
            debug!(conn_id, "requesting client is gone, dropping reply");
            return;
        };
        if client.outbox.send(Message::Text(text.into())).is_err() {
            warn!(conn_id, "client writer is gone, detaching client");
            *current = None;
        }
    }

    fn release(&self, conn_id: u64) {
        let mut current = self.current.lock();
        if current.as_ref().is_some_and(|client| client.conn_id == conn_id) {
            *current = None;
        }
    }
}
