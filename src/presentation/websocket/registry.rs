//! Connection Registry
//!
//! Tracks live sessions per chat and fans payloads out to them.
//!
//! Each chat is one `DashMap` entry, so accept, remove and broadcast for the
//! same chat are serialized by that entry's shard lock while different chats
//! proceed independently. The registry only ever touches channel senders;
//! socket writes happen in each session's writer task.

use std::collections::HashMap;

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::messages::Frame;
use crate::infrastructure::metrics;

pub type SessionId = Uuid;

/// One live session's outbound handle.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub id: SessionId,
    pub user_oid: Uuid,
    sender: mpsc::UnboundedSender<Frame>,
}

impl SessionHandle {
    pub fn new(user_oid: Uuid, sender: mpsc::UnboundedSender<Frame>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_oid,
            sender,
        }
    }

    /// Queue a frame. Fails only when the writer has gone away.
    pub fn send(&self, frame: Frame) -> bool {
        self.sender.send(frame).is_ok()
    }
}

/// Live sessions keyed by chat.
#[derive(Default)]
pub struct ConnectionRegistry {
    chats: DashMap<Uuid, HashMap<SessionId, SessionHandle>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session under the chat's bucket.
    pub fn accept_connection(&self, session: SessionHandle, chat_oid: Uuid) {
        let session_id = session.id;
        let user_oid = session.user_oid;

        let previous = self
            .chats
            .entry(chat_oid)
            .or_default()
            .insert(session_id, session);

        if previous.is_none() {
            metrics::websocket_session_opened();
        }

        tracing::info!(
            chat_oid = %chat_oid,
            session_id = %session_id,
            user_oid = %user_oid,
            "Session registered"
        );
    }

    /// Send `payload` to every session in the chat except `except`.
    ///
    /// Best-effort: a closed session is skipped and the rest still receive
    /// the payload. Returns how many sessions it was queued for.
    pub fn broadcast(&self, chat_oid: Uuid, payload: &str, except: Option<SessionId>) -> usize {
        let Some(bucket) = self.chats.get(&chat_oid) else {
            return 0;
        };

        let mut delivered = 0;
        for (session_id, session) in bucket.iter() {
            if Some(*session_id) == except {
                continue;
            }
            if session.send(Frame::Text(payload.to_owned())) {
                delivered += 1;
            } else {
                tracing::debug!(session_id = %session_id, "Skipping closed session");
            }
        }
        drop(bucket);

        metrics::record_broadcast_deliveries(delivered);
        delivered
    }

    /// Deregister a session. Unknown sessions are ignored.
    pub fn remove_connection(&self, session_id: SessionId, chat_oid: Uuid) -> bool {
        let removed = match self.chats.get_mut(&chat_oid) {
            Some(mut bucket) => bucket.remove(&session_id).is_some(),
            None => false,
        };

        // Drop the bucket once empty, re-checked under the entry lock
        self.chats.remove_if(&chat_oid, |_, bucket| bucket.is_empty());

        if removed {
            metrics::websocket_session_closed();
            tracing::info!(chat_oid = %chat_oid, session_id = %session_id, "Session unregistered");
        }
        removed
    }

    /// Sessions currently joined to the chat
    pub fn session_count(&self, chat_oid: Uuid) -> usize {
        self.chats.get(&chat_oid).map(|bucket| bucket.len()).unwrap_or(0)
    }

    /// Sessions across every chat
    pub fn total_sessions(&self) -> usize {
        self.chats.iter().map(|bucket| bucket.len()).sum()
    }

    /// Chats with at least one session
    pub fn chat_count(&self) -> usize {
        self.chats.len()
    }
}
