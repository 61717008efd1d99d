//! # tropex
//!
//! A question-driven recommender. tropex narrows a catalogue of films,
//! books and shows down to a handful of candidates by asking yes / no /
//! don't-care questions about their traits (tropes).
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! tropex --tropes data/tropes.csv \
//!     --media data/film_tropes.csv --media data/tv_tropes.csv \
//!     --http-port 6340
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use std::sync::Arc;
//! use tropex::prelude::*;
//!
//! let dataset = Dataset::build(
//!     vec![
//!         Item::new("m1", "The Matrix").with_traits(["t1", "t2"]),
//!         Item::new("m2", "Alien").with_trait("t2"),
//!     ],
//!     vec![Trait::new("t1", "Chosen One"), Trait::new("t2", "Big Bad")],
//! )
//! .unwrap();
//! let engine = NarrowingEngine::new(Arc::new(dataset));
//!
//! let mut session = engine.new_session();
//! while let Some(question) = engine.get_next_question(&session) {
//!     let id = question.id.to_string();
//!     engine.record_answer(&mut session, &id, Answer::Yes).unwrap();
//! }
//! assert_eq!(engine.get_candidates(&session, 20).len(), 1);
//! ```
//!
//! ## Crate Structure
//!
//! - [`tropex-core`](https://docs.rs/tropex-core) - Dataset index, sessions, candidate filter, question selector
//! - [`tropex-storage`](https://docs.rs/tropex-storage) - CSV ingestion, snapshots, LMDB mirror
//! - [`tropex-api`](https://docs.rs/tropex-api) - REST API over question sessions

// Re-export core types
pub use tropex_core::{
    Answer, Dataset, Item, ItemId, NarrowingEngine, Session, SessionPhase, Trait, TraitId,
    ItemFilter, TraitCondition, TraitFilter,
    Error, Result, DEFAULT_CANDIDATE_LIMIT,
};

// Re-export storage
pub use tropex_storage::{StorageConfig, StorageManager};

// Re-export API
pub use tropex_api::{ApiState, RestApi, SessionRegistry};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Answer, Dataset, Item, ItemId, NarrowingEngine, Session, SessionPhase, Trait, TraitId,
        ItemFilter, TraitCondition, TraitFilter,
        Error, Result, DEFAULT_CANDIDATE_LIMIT,
        StorageConfig, StorageManager,
        ApiState, RestApi,
    };
}
