//! Realtime notifier.
//!
//! Wraps the change-subscription websocket on the `messages` table. The
//! channel speaks a Phoenix-style framing: a join per topic, a periodic
//! heartbeat, and one event frame per row insert. Event payloads are never
//! used as data; an INSERT only wakes the feed controller, which re-reads
//! the store of record.

use crate::chat::config::ClientConfig;
use crate::chat::error::{ChatError, Result};
use crate::chat::feed::FeedController;
use crate::chat::listener::FeedListener;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio_tungstenite::MaybeTlsStream;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tracing::{debug, error, info, warn};

pub type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;
pub type WsReader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Binary subscription state; there are no intermediate states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Unsubscribed,
    Subscribed,
}

/// Channel topic for INSERTs on `messages`, optionally narrowed to one
/// conversation server-side.
pub fn channel_topic(conversation_id: Option<&str>) -> String {
    match conversation_id {
        Some(c) => format!("realtime:public:messages:conversation_id=eq.{c}"),
        None => "realtime:public:messages".to_string(),
    }
}

pub(crate) fn join_frame(topic: &str) -> serde_json::Value {
    serde_json::json!({
        "topic": topic,
        "event": "phx_join",
        "payload": {},
        "ref": "1",
    })
}

pub(crate) fn leave_frame(topic: &str) -> serde_json::Value {
    serde_json::json!({
        "topic": topic,
        "event": "phx_leave",
        "payload": {},
        "ref": "2",
    })
}

pub(crate) fn heartbeat_frame() -> serde_json::Value {
    serde_json::json!({
        "topic": "phoenix",
        "event": "heartbeat",
        "payload": {},
        "ref": null,
    })
}

/// Inbound channel frame. Only `event` matters to us.
#[derive(Debug, Deserialize)]
struct ChannelFrame {
    event: String,
    #[serde(default)]
    topic: String,
}

pub struct RealtimeNotifier {
    config: ClientConfig,
    topic: String,
    /// Shared with the reader task: the reader exiting means the channel is
    /// gone, and it flips this so `state()` keeps reporting reality.
    subscribed: Arc<AtomicBool>,
    writer: Option<Arc<Mutex<WsWriter>>>,
    tasks: Vec<JoinHandle<()>>,
}

impl RealtimeNotifier {
    pub fn new(config: ClientConfig) -> Self {
        let topic = channel_topic(config.conversation_id.as_deref());
        Self {
            config,
            topic,
            subscribed: Arc::new(AtomicBool::new(false)),
            writer: None,
            tasks: Vec::new(),
        }
    }

    pub fn state(&self) -> SubscriptionState {
        if self.subscribed.load(Ordering::SeqCst) {
            SubscriptionState::Subscribed
        } else {
            SubscriptionState::Unsubscribed
        }
    }

    /// Connects, joins the messages topic and starts the heartbeat and
    /// reader tasks. Subscribing while subscribed is a no-op.
    pub async fn subscribe(
        &mut self,
        controller: Arc<FeedController>,
        listener: Arc<dyn FeedListener>,
    ) -> Result<()> {
        if self.subscribed.load(Ordering::SeqCst) {
            debug!("[Realtime] already subscribed to {}", self.topic);
            return Ok(());
        }
        // remnants of a channel the server dropped
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.writer = None;

        let url = self.config.realtime_url();
        info!("[Realtime] connecting to channel {}", self.topic);
        let (ws_stream, response) = connect_async(&url)
            .await
            .map_err(|e| ChatError::Realtime(format!("connect: {e}")))?;
        debug!("[Realtime] websocket open, status {}", response.status());

        let (write, read) = ws_stream.split();
        let writer = Arc::new(Mutex::new(write));

        let join = serde_json::to_string(&join_frame(&self.topic))
            .map_err(|e| ChatError::Realtime(format!("encode join: {e}")))?;
        writer
            .lock()
            .await
            .send(WsMessage::Text(join))
            .await
            .map_err(|e| ChatError::Realtime(format!("join: {e}")))?;

        self.writer = Some(writer.clone());
        self.subscribed.store(true, Ordering::SeqCst);
        self.tasks.push(spawn_heartbeat(
            writer.clone(),
            self.config.heartbeat_secs,
        ));
        self.tasks.push(spawn_reader(
            read,
            controller,
            listener.clone(),
            self.subscribed.clone(),
        ));

        listener.on_subscription_changed(true).await;
        info!("[Realtime] subscribed to {}", self.topic);
        Ok(())
    }

    /// Leaves the topic and releases the channel. Unsubscribing while
    /// unsubscribed is a no-op.
    pub async fn unsubscribe(&mut self, listener: Arc<dyn FeedListener>) -> Result<()> {
        if !self.subscribed.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        if let Some(writer) = self.writer.take() {
            let leave = serde_json::to_string(&leave_frame(&self.topic))
                .map_err(|e| ChatError::Realtime(format!("encode leave: {e}")))?;
            if let Err(e) = writer.lock().await.send(WsMessage::Text(leave)).await {
                warn!("[Realtime] leave frame not delivered: {e}");
            }
            let _ = writer.lock().await.close().await;
        }
        for task in self.tasks.drain(..) {
            task.abort();
        }

        listener.on_subscription_changed(false).await;
        info!("[Realtime] unsubscribed from {}", self.topic);
        Ok(())
    }
}

fn spawn_heartbeat(writer: Arc<Mutex<WsWriter>>, secs: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(secs));
        loop {
            ticker.tick().await;
            let frame = match serde_json::to_string(&heartbeat_frame()) {
                Ok(f) => f,
                Err(_) => break,
            };
            let mut w = writer.lock().await;
            if w.send(WsMessage::Text(frame)).await.is_err() {
                break;
            }
        }
    })
}

fn spawn_reader(
    mut read: WsReader,
    controller: Arc<FeedController>,
    listener: Arc<dyn FeedListener>,
    subscribed: Arc<AtomicBool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = read.next().await {
            let text = match frame {
                Ok(WsMessage::Text(text)) => text,
                Ok(WsMessage::Close(_)) => {
                    warn!("[Realtime] server closed the channel");
                    listener
                        .on_notice("realtime channel closed by server".to_string())
                        .await;
                    break;
                }
                Ok(_) => continue,
                Err(e) => {
                    error!("[Realtime] read error: {e}");
                    listener.on_notice(format!("realtime channel error: {e}")).await;
                    break;
                }
            };
            match serde_json::from_str::<ChannelFrame>(&text) {
                Ok(frame) if frame.event == "INSERT" => {
                    debug!("[Realtime] INSERT on {}, re-reading feed", frame.topic);
                    controller.on_remote_insert().await;
                }
                Ok(frame) => debug!("[Realtime] ignoring {} frame", frame.event),
                Err(e) => debug!("[Realtime] unparseable frame ({e}): {text}"),
            }
        }
        // The reader stopping means the channel is gone; report the release
        // unless an explicit unsubscribe already did.
        if subscribed.swap(false, Ordering::SeqCst) {
            info!("[Realtime] channel lost, subscription released");
            listener.on_subscription_changed(false).await;
        }
    })
}
