//! Recommendation sessions and their chat history
//!
//! A [`Conversation`] records the parameters of a recommendation and the
//! follow-up exchanges that came after it. [`ConversationStore`] keeps them
//! in a bounded Moka cache: entries expire after a fixed time-to-live and the
//! least-recently-used sessions are evicted once capacity is reached.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::prompts::RecommendationRequest;

#[cfg(feature = "api")]
use moka::future::Cache;

#[cfg(feature = "api")]
use std::sync::Arc;

#[cfg(feature = "api")]
use std::time::Duration;

#[cfg(feature = "api")]
use tokio::sync::Mutex;

/// Chat turns retained per conversation (the opening system turn included)
pub const MAX_CHAT_TURNS: usize = 20;

const OPENING_NOTE: &str = "Initial recommendation provided.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub params: RecommendationRequest,
    pub initial_prompt: String,
    pub created_at: DateTime<Utc>,
    chat: Vec<ChatTurn>,
}

impl Conversation {
    pub fn new(params: RecommendationRequest, initial_prompt: String) -> Self {
        Self {
            params,
            initial_prompt,
            created_at: Utc::now(),
            chat: vec![ChatTurn {
                role: ChatRole::System,
                content: OPENING_NOTE.to_string(),
            }],
        }
    }

    pub fn chat(&self) -> &[ChatTurn] {
        &self.chat
    }

    /// Append a question and its answer, dropping the oldest whole exchanges
    /// (never the opening system turn) beyond [`MAX_CHAT_TURNS`]
    pub fn record_exchange(&mut self, question: &str, answer: &str) {
        self.chat.push(ChatTurn {
            role: ChatRole::User,
            content: question.to_string(),
        });
        self.chat.push(ChatTurn {
            role: ChatRole::Assistant,
            content: answer.to_string(),
        });

        while self.chat.len() > MAX_CHAT_TURNS {
            self.chat.drain(1..3);
        }
    }

    /// Up to `n` most recent (question, answer) pairs, oldest first
    pub fn recent_exchanges(&self, n: usize) -> Vec<(&str, &str)> {
        let pairs: Vec<(&str, &str)> = self
            .chat
            .windows(2)
            .filter_map(|w| match (w[0].role, w[1].role) {
                (ChatRole::User, ChatRole::Assistant) => {
                    Some((w[0].content.as_str(), w[1].content.as_str()))
                }
                _ => None,
            })
            .collect();
        let skip = pairs.len().saturating_sub(n);
        pairs.into_iter().skip(skip).collect()
    }
}

/// Shared handle to a stored conversation
#[cfg(feature = "api")]
pub type SharedConversation = Arc<Mutex<Conversation>>;

#[cfg(feature = "api")]
#[derive(Clone)]
pub struct ConversationStore {
    cache: Cache<String, SharedConversation>,
}

#[cfg(feature = "api")]
impl ConversationStore {
    pub fn new(max_capacity: u64, time_to_live: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(time_to_live)
            .build();
        Self { cache }
    }

    /// Store a fresh conversation, replacing any session with the same id
    pub async fn start(&self, session_id: String, conversation: Conversation) -> SharedConversation {
        let shared = Arc::new(Mutex::new(conversation));
        self.cache.insert(session_id, shared.clone()).await;
        shared
    }

    pub async fn get(&self, session_id: &str) -> Option<SharedConversation> {
        self.cache.get(session_id).await
    }

    /// Whether `shared` is still the conversation stored under `session_id`
    pub async fn is_current(&self, session_id: &str, shared: &SharedConversation) -> bool {
        self.get(session_id)
            .await
            .is_some_and(|stored| Arc::ptr_eq(&stored, shared))
    }

    /// Drop every session, returning how many were live
    pub async fn clear(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        let count = self.cache.entry_count();
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        count
    }

    /// Approximate number of live sessions
    pub async fn len(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
