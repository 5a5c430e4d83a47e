//! Conversation types and state management

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Default number of messages the interviewer remembers
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// The visible interview transcript. Append-only until the interview is reset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

/// Bookkeeping the interviewer keeps for one interview run.
///
/// `previous_messages` is a FIFO bounded by `history_limit`: once full, the
/// oldest message is evicted for each new one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    has_started: bool,
    previous_messages: VecDeque<Message>,
    retry_count: u32,
    history_limit: usize,
}

impl ConversationSession {
    pub fn new(history_limit: usize) -> Self {
        Self {
            has_started: false,
            previous_messages: VecDeque::with_capacity(history_limit),
            retry_count: 0,
            history_limit: history_limit.max(1),
        }
    }

    /// Forget everything; used when a new interview starts
    pub fn reset(&mut self) {
        self.has_started = false;
        self.previous_messages.clear();
        self.retry_count = 0;
    }

    /// Marks the interview as started. Returns `false` if it already was.
    pub fn begin(&mut self) -> bool {
        if self.has_started {
            return false;
        }
        self.has_started = true;
        true
    }

    pub fn has_started(&self) -> bool {
        self.has_started
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn history(&self) -> impl Iterator<Item = &Message> {
        self.previous_messages.iter()
    }

    pub fn history_len(&self) -> usize {
        self.previous_messages.len()
    }

    /// Remember a successful exchange and clear the failure counter
    pub fn record_exchange(&mut self, user: &str, reply: &str) {
        self.push(Message::user(user));
        self.push(Message::assistant(reply));
        self.retry_count = 0;
    }

    pub fn record_failure(&mut self) {
        self.retry_count += 1;
    }

    fn push(&mut self, message: Message) {
        self.previous_messages.push_back(message);
        while self.previous_messages.len() > self.history_limit {
            self.previous_messages.pop_front();
        }
    }
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_only_once() {
        let mut session = ConversationSession::default();
        assert!(session.begin());
        assert!(!session.begin());
        assert!(session.has_started());

        session.reset();
        assert!(session.begin());
    }

    #[test]
    fn test_history_is_bounded_fifo() {
        let mut session = ConversationSession::default();
        for turn in 0..8 {
            session.record_exchange(&format!("question {}", turn), &format!("answer {}", turn));
            assert!(session.history_len() <= DEFAULT_HISTORY_LIMIT);
        }

        assert_eq!(session.history_len(), 10);
        // 16 messages went in, the oldest 6 (turns 0..=2) were evicted
        let first = session.history().next().unwrap();
        assert_eq!(first.content, "question 3");
        let last = session.history().last().unwrap();
        assert_eq!(last.content, "answer 7");
        assert_eq!(last.role, Role::Assistant);
    }

    #[test]
    fn test_retry_count_resets_on_success() {
        let mut session = ConversationSession::default();
        session.record_failure();
        session.record_failure();
        assert_eq!(session.retry_count(), 2);

        session.record_exchange("hi", "hello");
        assert_eq!(session.retry_count(), 0);
    }

    #[test]
    fn test_transcript_append_and_clear() {
        let mut transcript = Transcript::new();
        transcript.push(Message::assistant("Welcome"));
        transcript.push(Message::user("Thanks"));
        assert_eq!(transcript.messages().len(), 2);
        assert_eq!(transcript.messages()[1].role, Role::User);

        transcript.clear();
        assert!(transcript.messages().is_empty());
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Message::system("x")).unwrap();
        assert_eq!(json, r#"{"role":"system","content":"x"}"#);
    }
}
