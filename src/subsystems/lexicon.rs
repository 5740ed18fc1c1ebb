//! Lexicon service — the operations behind the bot commands and the
//! scheduled broadcast, shared by every component through an `Arc`.

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::store::{self, ChatIdentity, StoreError, SubscriberRegistry};
use crate::subsystems::comms::{BroadcastReport, ChatTransport, broadcast};
use crate::words::{ResolveError, WordEntry, WordResolver};

pub const DAILY_HEADING: &str = "Word of the Day";
pub const ON_DEMAND_HEADING: &str = "New Word For You";

#[derive(Debug, Clone)]
pub struct LexiconService {
    resolver: WordResolver,
    subscribers: SubscriberRegistry,
}

impl LexiconService {
    pub fn new(resolver: WordResolver, subscribers: SubscriberRegistry) -> Self {
        Self { resolver, subscribers }
    }

    pub async fn subscribe(&self, chat_id: ChatIdentity) -> Result<(), StoreError> {
        let subscribers = self.subscribers.clone();
        store::blocking(move || subscribers.subscribe(chat_id)).await?;
        info!(chat_id, "subscribed");
        Ok(())
    }

    pub async fn unsubscribe(&self, chat_id: ChatIdentity) -> Result<(), StoreError> {
        let subscribers = self.subscribers.clone();
        store::blocking(move || subscribers.unsubscribe(chat_id)).await?;
        info!(chat_id, "unsubscribed");
        Ok(())
    }

    /// Resolve a fresh word for a single requester. The word joins the shared
    /// content store like any broadcast word.
    pub async fn new_word(&self) -> Result<WordEntry, ResolveError> {
        self.resolver.resolve().await
    }

    /// Resolve one word and send it to every subscriber.
    ///
    /// Returns `Ok(None)` when no unique word could be generated; the
    /// broadcast is skipped and subscribers hear nothing.
    pub async fn daily_broadcast<T: ChatTransport>(&self, transport: &T) -> Result<Option<BroadcastReport>, AppError> {
        let run_id = Uuid::now_v7();

        let entry = match self.resolver.resolve().await {
            Ok(entry) => entry,
            Err(ResolveError::Exhausted { attempts }) => {
                warn!(%run_id, attempts, "failed to generate unique word, skipping broadcast");
                return Ok(None);
            }
            Err(ResolveError::Store(e)) => return Err(e.into()),
        };

        let subscribers = self.subscribers.clone();
        let recipients = store::blocking(move || subscribers.list_subscribed()).await?;
        info!(%run_id, word = %entry.word, recipients = recipients.len(), "broadcasting");

        let report = broadcast(transport, &recipients, &entry.to_message(DAILY_HEADING)).await;
        info!(
            %run_id,
            delivered = report.delivered,
            failed = report.failed.len(),
            "broadcast finished"
        );
        Ok(Some(report))
    }
}
