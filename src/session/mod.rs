//! Conversation session state machine.
//!
//! A session owns an ordered sequence of committed turns plus a map from
//! turn-part key to elapsed duration. Exactly one turn may be in flight:
//! `ready → submitted → streaming → (ready | error)`. Turn parts form an
//! append-only log, each carrying a `pending → available` lifecycle tag.
//! Cancellation keeps already-appended parts and marks the turn with an
//! explicit truncation marker (the keep-partial option).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{SessionError, SessionResult};

/// Maximum accepted length of a user message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Marker appended to a turn that was stopped mid-stream.
pub const TRUNCATION_MARKER: &str = "[response stopped by user]";

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The person on the other end of the session.
    User,
    /// The concierge.
    Assistant,
}

/// Lifecycle tag of a turn part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartState {
    /// The part has started arriving but is not complete.
    Pending,
    /// The part is complete.
    Available,
}

/// One entry in a turn's append-only part log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnPart {
    /// Answer text.
    Text { text: String, state: PartState },
    /// Reasoning narration.
    Reasoning { text: String, state: PartState },
    /// A tool invocation.
    ToolCall {
        tool: String,
        input: String,
        state: PartState,
    },
    /// A tool invocation's result.
    ToolResult {
        tool: String,
        output: String,
        state: PartState,
    },
}

impl TurnPart {
    /// The part's lifecycle state.
    pub fn state(&self) -> PartState {
        match self {
            TurnPart::Text { state, .. }
            | TurnPart::Reasoning { state, .. }
            | TurnPart::ToolCall { state, .. }
            | TurnPart::ToolResult { state, .. } => *state,
        }
    }

    fn set_state(&mut self, new_state: PartState) {
        match self {
            TurnPart::Text { state, .. }
            | TurnPart::Reasoning { state, .. }
            | TurnPart::ToolCall { state, .. }
            | TurnPart::ToolResult { state, .. } => *state = new_state,
        }
    }

    /// Short name of the part kind, used in duration keys and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            TurnPart::Text { .. } => "text",
            TurnPart::Reasoning { .. } => "reasoning",
            TurnPart::ToolCall { .. } => "tool-call",
            TurnPart::ToolResult { .. } => "tool-result",
        }
    }
}

/// One committed or in-flight conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Unique turn identifier.
    pub id: String,
    /// Turn author.
    pub role: Role,
    /// Ordered part log.
    pub parts: Vec<TurnPart>,
    /// When the turn started.
    pub started_at: DateTime<Utc>,
    /// When the turn was committed; `None` while in flight.
    pub completed_at: Option<DateTime<Utc>>,
}

impl ConversationTurn {
    fn new(role: Role) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            parts: Vec::new(),
            started_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Accepting new input.
    Ready,
    /// User turn committed, awaiting the first assistant part.
    Submitted,
    /// Assistant parts are being appended incrementally.
    Streaming,
    /// The in-flight turn failed; prior turns remain valid.
    Error,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionStatus::Ready => "ready",
            SessionStatus::Submitted => "submitted",
            SessionStatus::Streaming => "streaming",
            SessionStatus::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// The persisted shape of a session: all turns plus the duration map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Committed turns in order.
    pub messages: Vec<ConversationTurn>,
    /// Map from turn-part key to elapsed milliseconds.
    pub durations: HashMap<String, u64>,
}

/// A single conversation session.
///
/// Owns its turn sequence and duration map exclusively; nothing is shared
/// across sessions.
#[derive(Debug, Clone)]
pub struct ChatSession {
    turns: Vec<ConversationTurn>,
    durations: HashMap<String, u64>,
    status: SessionStatus,
    in_flight: Option<ConversationTurn>,
}

impl ChatSession {
    /// Create an empty session in the `Ready` state.
    pub fn new() -> Self {
        Self {
            turns: Vec::new(),
            durations: HashMap::new(),
            status: SessionStatus::Ready,
            in_flight: None,
        }
    }

    /// Rebuild a session from a persisted record.
    pub fn from_record(record: SessionRecord) -> Self {
        Self {
            turns: record.messages,
            durations: record.durations,
            status: SessionStatus::Ready,
            in_flight: None,
        }
    }

    /// Snapshot the session for persistence. In-flight parts are not included
    /// until committed.
    pub fn to_record(&self) -> SessionRecord {
        SessionRecord {
            messages: self.turns.clone(),
            durations: self.durations.clone(),
        }
    }

    /// Current lifecycle state.
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Committed turns, oldest first.
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// The turn-part duration map.
    pub fn durations(&self) -> &HashMap<String, u64> {
        &self.durations
    }

    /// Whether an assistant turn is currently in flight.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The id of the in-flight assistant turn, if any.
    pub fn in_flight_turn_id(&self) -> Option<&str> {
        self.in_flight.as_ref().map(|t| t.id.as_str())
    }

    /// Commit a user turn and open the assistant turn.
    ///
    /// Rejects empty input, input over [`MAX_MESSAGE_CHARS`], and submission
    /// while another turn is in flight. Valid from `Ready` and `Error` (a
    /// retry after failure).
    pub fn submit(&mut self, text: &str) -> SessionResult<()> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        let len = trimmed.chars().count();
        if len > MAX_MESSAGE_CHARS {
            return Err(SessionError::MessageTooLong {
                len,
                max: MAX_MESSAGE_CHARS,
            });
        }
        if self.in_flight.is_some()
            || matches!(self.status, SessionStatus::Submitted | SessionStatus::Streaming)
        {
            return Err(SessionError::TurnInFlight);
        }

        let mut user_turn = ConversationTurn::new(Role::User);
        user_turn.parts.push(TurnPart::Text {
            text: trimmed.to_string(),
            state: PartState::Available,
        });
        user_turn.completed_at = Some(Utc::now());
        self.turns.push(user_turn);

        self.in_flight = Some(ConversationTurn::new(Role::Assistant));
        self.status = SessionStatus::Submitted;
        debug!(status = %self.status, "User turn committed");
        Ok(())
    }

    /// Commit a standalone assistant turn with the given text.
    ///
    /// Used to seed a fresh session with the welcome message; there is no
    /// user turn to pair it with.
    pub fn seed_assistant_turn(&mut self, text: &str) -> SessionResult<()> {
        if self.in_flight.is_some() {
            return Err(SessionError::TurnInFlight);
        }
        let mut turn = ConversationTurn::new(Role::Assistant);
        turn.parts.push(TurnPart::Text {
            text: text.to_string(),
            state: PartState::Available,
        });
        turn.completed_at = Some(Utc::now());
        self.turns.push(turn);
        Ok(())
    }

    /// Append a part to the in-flight assistant turn, returning its index.
    ///
    /// The first part moves the session from `Submitted` to `Streaming`.
    pub fn append_part(&mut self, part: TurnPart) -> SessionResult<usize> {
        let turn = self.in_flight.as_mut().ok_or(SessionError::NoTurnInFlight)?;
        turn.parts.push(part);
        if self.status == SessionStatus::Submitted {
            self.status = SessionStatus::Streaming;
        }
        Ok(turn.parts.len() - 1)
    }

    /// Resolve a pending part to `Available`.
    pub fn resolve_part(&mut self, index: usize) -> SessionResult<()> {
        let turn = self.in_flight.as_mut().ok_or(SessionError::NoTurnInFlight)?;
        let part = turn
            .parts
            .get_mut(index)
            .ok_or(SessionError::PartNotFound { index })?;
        part.set_state(PartState::Available);
        Ok(())
    }

    /// Record the elapsed duration for a turn-part key.
    pub fn record_duration(&mut self, key: String, elapsed_ms: u64) {
        self.durations.insert(key, elapsed_ms);
    }

    /// Commit the in-flight assistant turn and return to `Ready`.
    pub fn complete(&mut self) -> SessionResult<()> {
        let mut turn = self.in_flight.take().ok_or(SessionError::NoTurnInFlight)?;
        turn.completed_at = Some(Utc::now());
        self.turns.push(turn);
        self.status = SessionStatus::Ready;
        Ok(())
    }

    /// Mark the in-flight turn failed.
    ///
    /// The partial assistant turn is discarded; committed turns are
    /// untouched. A later `submit` retries from `Error`.
    pub fn fail(&mut self) {
        self.in_flight = None;
        self.status = SessionStatus::Error;
    }

    /// Stop an in-flight turn, keeping partial content.
    ///
    /// While `Submitted` or `Streaming`, commits already-appended parts with
    /// an explicit truncation marker and transitions immediately to `Ready`.
    /// A no-op in any other state.
    pub fn stop(&mut self) {
        if !matches!(self.status, SessionStatus::Submitted | SessionStatus::Streaming) {
            return;
        }
        if let Some(mut turn) = self.in_flight.take() {
            for part in &mut turn.parts {
                part.set_state(PartState::Available);
            }
            turn.parts.push(TurnPart::Text {
                text: TRUNCATION_MARKER.to_string(),
                state: PartState::Available,
            });
            turn.completed_at = Some(Utc::now());
            self.turns.push(turn);
        }
        self.status = SessionStatus::Ready;
        debug!("Turn stopped, partial content kept");
    }

    /// Atomically empty both the turn sequence and the duration map.
    /// Idempotent.
    pub fn clear(&mut self) {
        self.turns.clear();
        self.durations.clear();
        self.in_flight = None;
        self.status = SessionStatus::Ready;
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text_part(text: &str) -> TurnPart {
        TurnPart::Text {
            text: text.to_string(),
            state: PartState::Pending,
        }
    }

    #[test]
    fn test_new_session_is_ready_and_empty() {
        let session = ChatSession::new();
        assert_eq!(session.status(), SessionStatus::Ready);
        assert!(session.turns().is_empty());
        assert!(session.durations().is_empty());
        assert!(!session.is_in_flight());
    }

    #[test]
    fn test_submit_commits_user_turn_and_opens_assistant_turn() {
        let mut session = ChatSession::new();
        session.submit("Recommend a quiet rooftop restaurant").unwrap();

        assert_eq!(session.status(), SessionStatus::Submitted);
        assert_eq!(session.turns().len(), 1);
        assert_eq!(session.turns()[0].role, Role::User);
        assert!(session.turns()[0].completed_at.is_some());
        assert!(session.is_in_flight());
    }

    #[test]
    fn test_submit_rejects_empty_and_whitespace() {
        let mut session = ChatSession::new();
        assert!(matches!(session.submit(""), Err(SessionError::EmptyMessage)));
        assert!(matches!(session.submit("   "), Err(SessionError::EmptyMessage)));
    }

    #[test]
    fn test_submit_rejects_overlong_message() {
        let mut session = ChatSession::new();
        let long = "x".repeat(MAX_MESSAGE_CHARS + 1);
        let result = session.submit(&long);
        assert!(matches!(
            result,
            Err(SessionError::MessageTooLong { len: 2001, max: 2000 })
        ));
    }

    #[test]
    fn test_submit_accepts_exactly_max_length() {
        let mut session = ChatSession::new();
        let exact = "x".repeat(MAX_MESSAGE_CHARS);
        assert!(session.submit(&exact).is_ok());
    }

    #[test]
    fn test_second_submit_while_in_flight_is_rejected() {
        let mut session = ChatSession::new();
        session.submit("first").unwrap();
        assert!(matches!(
            session.submit("second"),
            Err(SessionError::TurnInFlight)
        ));
    }

    #[test]
    fn test_first_part_moves_submitted_to_streaming() {
        let mut session = ChatSession::new();
        session.submit("hello there, plan a trip").unwrap();
        assert_eq!(session.status(), SessionStatus::Submitted);

        session.append_part(text_part("Working on it")).unwrap();
        assert_eq!(session.status(), SessionStatus::Streaming);
    }

    #[test]
    fn test_part_lifecycle_pending_to_available() {
        let mut session = ChatSession::new();
        session.submit("plan a trip").unwrap();

        let index = session.append_part(text_part("draft")).unwrap();
        session.resolve_part(index).unwrap();
        session.complete().unwrap();

        let assistant = &session.turns()[1];
        assert_eq!(assistant.parts[0].state(), PartState::Available);
    }

    #[test]
    fn test_parts_preserve_append_order() {
        let mut session = ChatSession::new();
        session.submit("plan a trip").unwrap();

        session
            .append_part(TurnPart::Reasoning {
                text: "thinking".to_string(),
                state: PartState::Available,
            })
            .unwrap();
        session
            .append_part(TurnPart::ToolCall {
                tool: "retrieval".to_string(),
                input: "trip".to_string(),
                state: PartState::Available,
            })
            .unwrap();
        session
            .append_part(TurnPart::ToolResult {
                tool: "retrieval".to_string(),
                output: "2 matches".to_string(),
                state: PartState::Available,
            })
            .unwrap();
        session.append_part(text_part("answer")).unwrap();
        session.complete().unwrap();

        let kinds: Vec<&str> = session.turns()[1].parts.iter().map(|p| p.kind()).collect();
        assert_eq!(kinds, vec!["reasoning", "tool-call", "tool-result", "text"]);
    }

    #[test]
    fn test_complete_commits_turn_and_returns_to_ready() {
        let mut session = ChatSession::new();
        session.submit("plan a trip").unwrap();
        session.append_part(text_part("answer")).unwrap();
        session.complete().unwrap();

        assert_eq!(session.status(), SessionStatus::Ready);
        assert_eq!(session.turns().len(), 2);
        assert_eq!(session.turns()[1].role, Role::Assistant);
        assert!(!session.is_in_flight());
    }

    #[test]
    fn test_stop_mid_stream_keeps_partial_with_marker() {
        let mut session = ChatSession::new();
        session.submit("plan a trip").unwrap();
        session.append_part(text_part("partial answer")).unwrap();

        let committed_before = session.turns()[0].clone();
        session.stop();

        assert_eq!(session.status(), SessionStatus::Ready);
        assert!(!session.is_in_flight());
        // Prior committed turns intact and unmodified.
        assert_eq!(session.turns()[0], committed_before);
        // Partial content kept, truncation marker appended.
        let stopped = &session.turns()[1];
        assert_eq!(stopped.parts.len(), 2);
        assert!(matches!(
            &stopped.parts[1],
            TurnPart::Text { text, .. } if text == TRUNCATION_MARKER
        ));
        assert_eq!(stopped.parts[0].state(), PartState::Available);
    }

    #[test]
    fn test_stop_while_ready_is_a_no_op() {
        let mut session = ChatSession::new();
        session.stop();
        assert_eq!(session.status(), SessionStatus::Ready);
        assert!(session.turns().is_empty());
    }

    #[test]
    fn test_fail_discards_in_flight_and_allows_retry() {
        let mut session = ChatSession::new();
        session.submit("plan a trip").unwrap();
        session.append_part(text_part("partial")).unwrap();
        session.fail();

        assert_eq!(session.status(), SessionStatus::Error);
        assert_eq!(session.turns().len(), 1);

        // Retry from error.
        session.submit("plan a trip again").unwrap();
        assert_eq!(session.status(), SessionStatus::Submitted);
    }

    #[test]
    fn test_clear_empties_turns_and_durations() {
        let mut session = ChatSession::new();
        session.submit("plan a trip").unwrap();
        session.append_part(text_part("answer")).unwrap();
        session.complete().unwrap();
        session.record_duration("turn:0".to_string(), 120);

        session.clear();
        assert!(session.turns().is_empty());
        assert!(session.durations().is_empty());
        assert_eq!(session.status(), SessionStatus::Ready);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut session = ChatSession::new();
        session.submit("plan a trip").unwrap();
        session.complete().unwrap();
        session.record_duration("k".to_string(), 5);

        session.clear();
        let after_once = session.to_record();
        session.clear();
        let after_twice = session.to_record();

        assert_eq!(after_once, after_twice);
        assert_eq!(after_once, SessionRecord::default());
    }

    #[test]
    fn test_record_round_trip_preserves_order_and_durations() {
        let mut session = ChatSession::new();
        session.submit("plan a trip").unwrap();
        session.append_part(text_part("answer")).unwrap();
        session.complete().unwrap();
        session.record_duration("turn:0:text".to_string(), 88);

        let record = session.to_record();
        let restored = ChatSession::from_record(record.clone());

        assert_eq!(restored.turns(), session.turns());
        assert_eq!(restored.durations(), session.durations());
        assert_eq!(restored.status(), SessionStatus::Ready);
        assert_eq!(restored.to_record(), record);
    }

    #[test]
    fn test_record_serde_round_trip_is_lossless_for_all_part_types() {
        let mut session = ChatSession::new();
        session.submit("plan a trip").unwrap();
        session
            .append_part(TurnPart::Reasoning {
                text: "consulting the collection".to_string(),
                state: PartState::Available,
            })
            .unwrap();
        session
            .append_part(TurnPart::ToolCall {
                tool: "retrieval".to_string(),
                input: "trip".to_string(),
                state: PartState::Available,
            })
            .unwrap();
        session
            .append_part(TurnPart::ToolResult {
                tool: "retrieval".to_string(),
                output: "1 match".to_string(),
                state: PartState::Pending,
            })
            .unwrap();
        session.append_part(text_part("the answer")).unwrap();
        session.complete().unwrap();
        session.record_duration("a".to_string(), 1);
        session.record_duration("b".to_string(), 2);

        let record = session.to_record();
        let json = serde_json::to_string(&record).unwrap();
        let back: SessionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_append_part_without_in_flight_turn_fails() {
        let mut session = ChatSession::new();
        assert!(matches!(
            session.append_part(text_part("orphan")),
            Err(SessionError::NoTurnInFlight)
        ));
    }

    #[test]
    fn test_resolve_part_bad_index_fails() {
        let mut session = ChatSession::new();
        session.submit("plan a trip").unwrap();
        assert!(matches!(
            session.resolve_part(7),
            Err(SessionError::PartNotFound { index: 7 })
        ));
    }
}
