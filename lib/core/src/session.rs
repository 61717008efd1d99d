use crate::{Error, Result, TraitId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A user's response to a trait question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    Yes,
    No,
    DontCare,
}

/// Coarse progress of a session, see [`crate::NarrowingEngine::phase`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No answers recorded yet
    Fresh,
    Narrowing,
    /// Candidate count at or below the caller's threshold
    Converged,
    /// No askable trait remains
    Exhausted,
}

/// Answer buckets for one conversation.
///
/// `required` and `excluded` drive candidate filtering; `ignored` holds every
/// Yes and DontCare trait. A trait is recorded at most once: re-answers are
/// rejected so the candidate set only ever shrinks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    required: BTreeSet<TraitId>,
    excluded: BTreeSet<TraitId>,
    ignored: BTreeSet<TraitId>,
    history: Vec<(TraitId, Answer)>,
}

impl Session {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `answer` for `trait_id`. Does not check that the trait exists;
    /// the engine does that against its dataset.
    pub fn record(&mut self, trait_id: impl Into<TraitId>, answer: Answer) -> Result<()> {
        let trait_id = trait_id.into();
        if self.is_answered(trait_id.as_str()) {
            return Err(Error::AlreadyAnswered(trait_id.to_string()));
        }

        match answer {
            Answer::Yes => {
                self.required.insert(trait_id.clone());
                self.ignored.insert(trait_id.clone());
            }
            Answer::No => {
                self.excluded.insert(trait_id.clone());
            }
            Answer::DontCare => {
                self.ignored.insert(trait_id.clone());
            }
        }
        self.history.push((trait_id, answer));
        Ok(())
    }

    #[inline]
    pub fn required(&self) -> &BTreeSet<TraitId> {
        &self.required
    }

    #[inline]
    pub fn excluded(&self) -> &BTreeSet<TraitId> {
        &self.excluded
    }

    #[inline]
    pub fn ignored(&self) -> &BTreeSet<TraitId> {
        &self.ignored
    }

    /// Answers in the order they were given
    #[inline]
    pub fn answers(&self) -> &[(TraitId, Answer)] {
        &self.history
    }

    pub fn answer_for(&self, trait_id: &str) -> Option<Answer> {
        self.history
            .iter()
            .find(|(id, _)| id.as_str() == trait_id)
            .map(|(_, answer)| *answer)
    }

    /// True once the trait must never be asked again
    #[inline]
    pub fn is_answered(&self, trait_id: &str) -> bool {
        self.ignored.contains(trait_id) || self.excluded.contains(trait_id)
    }

    #[inline]
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.history.len()
    }

    #[inline]
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        self.history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_follow_answers() {
        let mut s = Session::new();
        s.record("T1", Answer::Yes).unwrap();
        s.record("T2", Answer::No).unwrap();
        s.record("T3", Answer::DontCare).unwrap();

        assert!(s.required().contains("T1"));
        assert!(s.ignored().contains("T1"));
        assert!(s.excluded().contains("T2"));
        assert!(!s.ignored().contains("T2"));
        assert!(s.ignored().contains("T3"));
        assert!(!s.required().contains("T3"));
        assert_eq!(s.answered_count(), 3);
        assert_eq!(s.answer_for("T2"), Some(Answer::No));
    }

    #[test]
    fn re_answer_is_rejected_without_side_effects() {
        let mut s = Session::new();
        s.record("T1", Answer::Yes).unwrap();
        let before = s.clone();

        let err = s.record("T1", Answer::No).unwrap_err();
        assert!(matches!(err, Error::AlreadyAnswered(id) if id == "T1"));
        assert_eq!(s, before);

        s.record("T2", Answer::No).unwrap();
        assert!(s.record("T2", Answer::No).is_err());
        assert_eq!(s.excluded().len(), 1);
    }

    #[test]
    fn answer_wire_names() {
        let a: Answer = serde_json::from_str("\"dont_care\"").unwrap();
        assert_eq!(a, Answer::DontCare);
        assert_eq!(serde_json::to_string(&Answer::Yes).unwrap(), "\"yes\"");
    }
}
