use crate::{filter, selector, Answer, Dataset, Error, Item, Result, Session, SessionPhase, Trait};
use std::sync::Arc;

/// Candidates returned when the caller does not pick a limit
pub const DEFAULT_CANDIDATE_LIMIT: usize = 20;

/// Session-facing operations over a shared, immutable [`Dataset`].
///
/// The engine holds no per-conversation state; each caller owns its
/// [`Session`] and passes it in.
#[derive(Debug, Clone)]
pub struct NarrowingEngine {
    dataset: Arc<Dataset>,
}

impl NarrowingEngine {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        Self { dataset }
    }

    #[inline]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Start a conversation
    #[inline]
    #[must_use]
    pub fn new_session(&self) -> Session {
        Session::new()
    }

    /// Record an answer. Unknown traits and re-answers are rejected and
    /// leave `session` untouched.
    pub fn record_answer(&self, session: &mut Session, trait_id: &str, answer: Answer) -> Result<()> {
        if !self.dataset.contains_trait(trait_id) {
            return Err(Error::InvalidAnswer(trait_id.to_string()));
        }
        session.record(trait_id, answer)?;
        tracing::debug!(trait_id, ?answer, answered = session.answered_count(), "answer recorded");
        Ok(())
    }

    /// At most `limit` items consistent with the session, ascending by id
    pub fn get_candidates(&self, session: &Session, limit: usize) -> Vec<&Item> {
        filter::candidates(&self.dataset, session, Some(limit))
    }

    /// The most discriminating unanswered trait. `None` once no remaining
    /// candidate holds an unanswered trait.
    pub fn get_next_question(&self, session: &Session) -> Option<&Trait> {
        let next = selector::next_trait(&self.dataset, session);
        if next.is_none() {
            tracing::debug!(answered = session.answered_count(), "no question left");
        }
        next
    }

    /// Up to `n` alternative questions with how many candidates have each trait
    pub fn rank_questions(&self, session: &Session, n: usize) -> Vec<(&Trait, usize)> {
        selector::rank_traits(&self.dataset, session, n)
    }

    /// Number of items consistent with the session
    pub fn candidate_count(&self, session: &Session) -> usize {
        filter::candidates(&self.dataset, session, None).len()
    }

    /// Where the session stands. `converge_at` is the candidate count at or
    /// below which the caller considers the search done. Purely advisory.
    pub fn phase(&self, session: &Session, converge_at: usize) -> SessionPhase {
        if session.is_fresh() {
            return SessionPhase::Fresh;
        }
        if self.get_next_question(session).is_none() {
            return SessionPhase::Exhausted;
        }
        if self.candidate_count(session) <= converge_at {
            return SessionPhase::Converged;
        }
        SessionPhase::Narrowing
    }
}
