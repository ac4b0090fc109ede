//! Fire-and-forget notifications to the main process
//!
//! Every blog save is mirrored to the privileged main process on
//! [`BLOG_SERIALIZED_CHANNEL`]. Delivery is best effort: there is no
//! acknowledgement, and senders must not fail their own operation when a
//! message cannot be delivered.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;

pub const BLOG_SERIALIZED_CHANNEL: &str = "blog-serialized";

#[derive(Error, Debug)]
pub enum IpcError {
    #[error("Receiving process is gone")]
    Disconnected,
    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpcMessage {
    pub channel: String,
    pub payload: Value,
}

pub trait Messenger: Send + Sync {
    fn send(&self, channel: &str, payload: Value) -> Result<(), IpcError>;
}

/// In-process bridge to a receiver task
#[derive(Debug, Clone)]
pub struct ChannelMessenger {
    tx: mpsc::UnboundedSender<IpcMessage>,
}

pub type IpcReceiver = mpsc::UnboundedReceiver<IpcMessage>;

impl ChannelMessenger {
    pub fn new() -> (Self, IpcReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Messenger for ChannelMessenger {
    fn send(&self, channel: &str, payload: Value) -> Result<(), IpcError> {
        self.tx
            .send(IpcMessage {
                channel: channel.to_string(),
                payload,
            })
            .map_err(|_| IpcError::Disconnected)
    }
}

/// One JSON message per line, for a parent process reading our stdout
pub struct JsonLinesMessenger<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesMessenger<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> Messenger for JsonLinesMessenger<W> {
    fn send(&self, channel: &str, payload: Value) -> Result<(), IpcError> {
        let line = serde_json::to_string(&IpcMessage {
            channel: channel.to_string(),
            payload,
        })?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| IpcError::Transport("writer lock poisoned".to_string()))?;
        writeln!(writer, "{line}").map_err(|e| IpcError::Transport(e.to_string()))?;
        writer
            .flush()
            .map_err(|e| IpcError::Transport(e.to_string()))
    }
}

/// Used when nobody is listening
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMessenger;

impl Messenger for LogMessenger {
    fn send(&self, channel: &str, payload: Value) -> Result<(), IpcError> {
        let id = payload.get("id").and_then(Value::as_str).unwrap_or("-");
        tracing::debug!("[{}] blog {} (no listener)", channel, id);
        Ok(())
    }
}

#[cfg(feature = "tauri")]
impl<R: tauri::Runtime> Messenger for tauri::AppHandle<R> {
    fn send(&self, channel: &str, payload: Value) -> Result<(), IpcError> {
        use tauri::Emitter;

        self.emit(channel, payload)
            .map_err(|e| IpcError::Transport(e.to_string()))
    }
}

/// Main-process copy of every blog it has been told about
#[derive(Debug, Default)]
pub struct BlogMirror {
    blogs: HashMap<String, Value>,
}

impl BlogMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one message; returns false for other channels or payloads without an id
    pub fn apply(&mut self, message: &IpcMessage) -> bool {
        if message.channel != BLOG_SERIALIZED_CHANNEL {
            return false;
        }
        let Some(id) = message.payload.get("id").and_then(Value::as_str) else {
            tracing::warn!("Dropping blog notification without id");
            return false;
        };
        self.blogs.insert(id.to_string(), message.payload.clone());
        true
    }

    /// Drain `rx` until every sender is dropped
    pub async fn run(&mut self, mut rx: IpcReceiver) {
        while let Some(message) = rx.recv().await {
            self.apply(&message);
        }
        tracing::debug!("Blog mirror stopped with {} blogs", self.blogs.len());
    }

    pub fn get(&self, id: &str) -> Option<&Value> {
        self.blogs.get(id)
    }

    pub fn len(&self) -> usize {
        self.blogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blogs.is_empty()
    }

    /// Mirrored blogs ordered by their `index`
    pub fn blogs(&self) -> Vec<&Value> {
        let mut blogs: Vec<&Value> = self.blogs.values().collect();
        blogs.sort_by_key(|b| b.get("index").and_then(Value::as_i64).unwrap_or(0));
        blogs
    }

    pub fn selected(&self) -> Option<&Value> {
        self.blogs
            .values()
            .find(|b| b.get("isSelected").and_then(Value::as_bool) == Some(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn mirror_collects_blog_messages() {
        let (messenger, rx) = ChannelMessenger::new();
        messenger
            .send(
                BLOG_SERIALIZED_CHANNEL,
                json!({"id": "b", "index": 1, "isSelected": true}),
            )
            .unwrap();
        messenger
            .send(BLOG_SERIALIZED_CHANNEL, json!({"id": "a", "index": 0}))
            .unwrap();
        messenger.send("other-channel", json!({"id": "c"})).unwrap();
        messenger
            .send(BLOG_SERIALIZED_CHANNEL, json!({"index": 5}))
            .unwrap();
        drop(messenger);

        let mut mirror = BlogMirror::new();
        mirror.run(rx).await;

        assert_eq!(mirror.len(), 2);
        let ids: Vec<&str> = mirror
            .blogs()
            .iter()
            .filter_map(|b| b["id"].as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(mirror.selected().unwrap()["id"], "b");
    }

    #[test]
    fn later_messages_replace_earlier_ones() {
        let mut mirror = BlogMirror::new();
        let first = IpcMessage {
            channel: BLOG_SERIALIZED_CHANNEL.to_string(),
            payload: json!({"id": "a", "name": "Old"}),
        };
        let second = IpcMessage {
            channel: BLOG_SERIALIZED_CHANNEL.to_string(),
            payload: json!({"id": "a", "name": "New"}),
        };
        assert!(mirror.apply(&first));
        assert!(mirror.apply(&second));
        assert_eq!(mirror.get("a").unwrap()["name"], "New");
    }

    #[test]
    fn closed_channel_reports_disconnect() {
        let (messenger, rx) = ChannelMessenger::new();
        drop(rx);
        assert!(matches!(
            messenger.send(BLOG_SERIALIZED_CHANNEL, json!({})),
            Err(IpcError::Disconnected)
        ));
    }

    #[test]
    fn json_lines_writes_one_line_per_message() {
        let messenger = JsonLinesMessenger::new(Vec::new());
        messenger
            .send(BLOG_SERIALIZED_CHANNEL, json!({"id": "a"}))
            .unwrap();
        messenger
            .send(BLOG_SERIALIZED_CHANNEL, json!({"id": "b"}))
            .unwrap();

        let output = String::from_utf8(messenger.into_inner()).unwrap();
        let lines: Vec<IpcMessage> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].channel, BLOG_SERIALIZED_CHANNEL);
        assert_eq!(lines[1].payload["id"], "b");
    }
}
