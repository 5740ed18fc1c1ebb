//! Comms — the chat transport seam, the broadcaster, and the command surface.
//!
//! [`ChatTransport`] is implemented for `teloxide::Bot` in [`telegram`];
//! tests plug in a recording transport.

pub mod commands;
pub mod telegram;

use std::future::Future;

use thiserror::Error;
use tracing::{debug, warn};

use crate::store::ChatIdentity;

/// Telegram has a 4096 character limit per message; chunk below it.
pub const MAX_MESSAGE_LENGTH: usize = 4000;

#[derive(Debug, Error)]
#[error("send to {chat_id} failed: {reason}")]
pub struct TransportError {
    pub chat_id: ChatIdentity,
    pub reason: String,
}

/// Outbound half of a chat platform.
pub trait ChatTransport: Send + Sync + 'static {
    fn send_text(&self, chat_id: ChatIdentity, text: &str) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Outcome of one broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: Vec<ChatIdentity>,
}

/// Send `text` to every recipient in turn. A failed send is logged and
/// recorded; it never stops delivery to the rest.
pub async fn broadcast<T: ChatTransport>(transport: &T, recipients: &[ChatIdentity], text: &str) -> BroadcastReport {
    let mut report = BroadcastReport::default();
    for &chat_id in recipients {
        match transport.send_text(chat_id, text).await {
            Ok(()) => {
                debug!(chat_id, "delivered");
                report.delivered += 1;
            }
            Err(e) => {
                warn!(chat_id, error = %e, "broadcast delivery failed");
                report.failed.push(chat_id);
            }
        }
    }
    report
}

/// Split `text` into chunks of at most `max_chars` characters.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars.chunks(max_chars.max(1)).map(|c| c.iter().collect()).collect()
}
