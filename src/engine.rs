//! The per-turn driver tying the session, arbiter, composer, and storage
//! together.
//!
//! A turn flows: submit → classify → decide → execute tiers (logging
//! tool-call/tool-result parts as each tier runs) → compose → text part →
//! complete. The session is persisted after every mutating transition; a
//! persistence failure is logged and never blocks the turn.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::arbiter::{is_out_of_bounds, Arbiter, Query, ToolPlan};
use crate::composer::{AnswerDraft, Composer};
use crate::error::AppResult;
use crate::prompts;
use crate::session::{ChatSession, PartState, SessionStatus, TurnPart};
use crate::storage::Storage;

/// The orchestration core for one conversation session.
///
/// Owns the session exclusively; only one turn may be in flight at a time,
/// and tool tiers within a turn run strictly in series.
pub struct ConciergeEngine {
    storage: Arc<dyn Storage>,
    arbiter: Arbiter,
    composer: Composer,
    session: ChatSession,
}

impl ConciergeEngine {
    /// Build an engine, loading any persisted session.
    ///
    /// A storage failure on load degrades to an empty session. A fresh
    /// session gets the welcome message as its first assistant turn.
    pub async fn new(storage: Arc<dyn Storage>, arbiter: Arbiter, composer: Composer) -> Self {
        let record = match storage.load().await {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Failed to load session, starting empty");
                Default::default()
            }
        };

        let mut session = ChatSession::from_record(record);
        if session.turns().is_empty() {
            inject_welcome(&mut session);
        }

        let mut engine = Self {
            storage,
            arbiter,
            composer,
            session,
        };
        engine.persist().await;
        engine
    }

    /// The session, for inspection.
    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    /// Process one user turn end to end, returning the composed answer.
    pub async fn handle_turn(&mut self, text: &str) -> AppResult<AnswerDraft> {
        self.session.submit(text)?;
        self.persist().await;

        let draft = if is_out_of_bounds(text) {
            warn!("Request declined by guardrail");
            AnswerDraft {
                text: prompts::GUARDRAIL_REFUSAL.to_string(),
                citations: Vec::new(),
            }
        } else {
            let query = Query::classify(text);
            info!(intent = %query.intent, "Turn classified");

            let plan = self.arbiter.decide(&query);

            if plan.is_empty() {
                self.composer.compose_untooled(&query)
            } else {
                match self.run_plan(&query, &plan).await {
                    Ok(draft) => draft,
                    Err(e) => {
                        self.session.fail();
                        self.persist().await;
                        return Err(e);
                    }
                }
            }
        };

        let start = Instant::now();
        let index = self.session.append_part(TurnPart::Text {
            text: draft.text.clone(),
            state: PartState::Available,
        })?;
        self.record_part_duration(index, start.elapsed().as_millis() as u64);

        self.session.complete()?;
        self.persist().await;
        Ok(draft)
    }

    /// Run a non-empty tool plan, logging each tier into the turn.
    async fn run_plan(&mut self, query: &Query, plan: &ToolPlan) -> AppResult<AnswerDraft> {
        let reasoning = self.session.append_part(TurnPart::Reasoning {
            text: "Consulting the curated collection before anything broader.".to_string(),
            state: PartState::Pending,
        })?;
        self.session.resolve_part(reasoning)?;
        self.persist().await;

        let record = self.arbiter.execute(query, plan).await;

        for invocation in &record.invocations {
            let call = self.session.append_part(TurnPart::ToolCall {
                tool: invocation.tier.to_string(),
                input: invocation.input.clone(),
                state: PartState::Pending,
            })?;
            let result = self.session.append_part(TurnPart::ToolResult {
                tool: invocation.tier.to_string(),
                output: invocation.summary.clone(),
                state: PartState::Pending,
            })?;
            self.session.resolve_part(call)?;
            self.session.resolve_part(result)?;
            self.record_part_duration(result, invocation.elapsed_ms);
            self.persist().await;
        }

        let draft = self.composer.compose(query, &record.outcome)?;
        Ok(draft)
    }

    /// Stop the in-flight turn, keeping partial content.
    pub async fn stop(&mut self) {
        self.session.stop();
        self.persist().await;
    }

    /// Clear the session: turns and durations emptied atomically.
    pub async fn clear(&mut self) {
        self.session.clear();
        if let Err(e) = self.storage.clear().await {
            warn!(error = %e, "Failed to clear persisted session");
        }
        inject_welcome(&mut self.session);
        self.persist().await;
    }

    /// Whether a new submission would currently be accepted.
    pub fn ready(&self) -> bool {
        matches!(
            self.session.status(),
            SessionStatus::Ready | SessionStatus::Error
        )
    }

    fn record_part_duration(&mut self, part_index: usize, elapsed_ms: u64) {
        if let Some(turn_id) = self.session.in_flight_turn_id() {
            let key = format!("{}:{}", turn_id, part_index);
            self.session.record_duration(key, elapsed_ms);
        }
    }

    /// Persist the current session; failures are logged, never surfaced.
    async fn persist(&self) {
        if let Err(e) = self.storage.save(&self.session.to_record()).await {
            warn!(error = %e, "Failed to persist session");
        }
    }
}

/// Seed a fresh session with the welcome message.
fn inject_welcome(session: &mut ChatSession) {
    // The welcome turn is synthesized directly rather than via submit():
    // there is no user turn to pair it with.
    if let Err(e) = session.seed_assistant_turn(prompts::WELCOME_MESSAGE) {
        warn!(error = %e, "Failed to seed welcome message");
    }
}
