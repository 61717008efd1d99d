//! # tropex Core
//!
//! Core library for the tropex narrowing engine.
//!
//! Recommendations are found by asking yes / no / don't-care questions about
//! traits until few candidate items remain. This crate provides:
//!
//! - [`Dataset`] - Immutable item/trait relation with indices both ways
//! - [`Session`] - Per-conversation answer buckets
//! - [`TraitFilter`] - Candidate filtering over trait conditions
//! - [`selector`] - Greedy choice of the next trait to ask about
//! - [`NarrowingEngine`] - Facade tying the above together
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tropex_core::{Answer, Dataset, Item, NarrowingEngine, Trait};
//!
//! let dataset = Dataset::build(
//!     vec![
//!         Item::new("A", "Alpha").with_traits(["T1", "T2"]),
//!         Item::new("B", "Beta").with_trait("T2"),
//!         Item::new("C", "Gamma").with_trait("T3"),
//!     ],
//!     vec![Trait::new("T1", "One"), Trait::new("T2", "Two"), Trait::new("T3", "Three")],
//! )
//! .unwrap();
//! let engine = NarrowingEngine::new(Arc::new(dataset));
//!
//! let mut session = engine.new_session();
//! engine.record_answer(&mut session, "T3", Answer::No).unwrap();
//! assert_eq!(engine.get_candidates(&session, 20).len(), 2);
//! assert_eq!(engine.get_next_question(&session).unwrap().id.as_str(), "T2");
//! ```

pub mod dataset;
pub mod engine;
pub mod error;
pub mod filter;
pub mod model;
pub mod selector;
pub mod session;

#[cfg(test)]
mod proptests;

pub use dataset::Dataset;
pub use engine::{NarrowingEngine, DEFAULT_CANDIDATE_LIMIT};
pub use error::{Error, Result};
pub use filter::{candidates, ItemFilter, TraitCondition, TraitFilter};
pub use model::{Item, ItemId, Trait, TraitId};
pub use selector::{next_trait, rank_traits};
pub use session::{Answer, Session, SessionPhase};
