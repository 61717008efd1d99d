use crate::{Answer, Dataset, Item, NarrowingEngine, Session, Trait};
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;

fn build(n_traits: usize, masks: Vec<Vec<bool>>) -> Dataset {
    let traits = (0..n_traits)
        .map(|t| Trait::new(format!("T{t}"), format!("Trait {t}")))
        .collect();
    let items = masks
        .into_iter()
        .enumerate()
        .map(|(i, mask)| {
            let owned = mask
                .iter()
                .enumerate()
                .filter(|(_, has)| **has)
                .map(|(t, _)| format!("T{t}"));
            Item::new(format!("I{i:02}"), format!("Item {i}")).with_traits(owned)
        })
        .collect();
    Dataset::build(items, traits).unwrap()
}

fn arb_dataset() -> impl Strategy<Value = Dataset> {
    (1usize..8).prop_flat_map(|n_traits| {
        prop::collection::vec(prop::collection::vec(any::<bool>(), n_traits), 0..12)
            .prop_map(move |masks| build(n_traits, masks))
    })
}

fn arb_answers() -> impl Strategy<Value = Vec<(usize, Answer)>> {
    prop::collection::vec(
        (
            0usize..8,
            prop_oneof![Just(Answer::Yes), Just(Answer::No), Just(Answer::DontCare)],
        ),
        0..8,
    )
}

// Unknown and repeated traits are rejected by the engine; skip them
fn answer_all(engine: &NarrowingEngine, answers: &[(usize, Answer)]) -> Session {
    let mut session = engine.new_session();
    for (t, answer) in answers {
        let _ = engine.record_answer(&mut session, &format!("T{t}"), *answer);
    }
    session
}

fn ids(items: &[&Item]) -> Vec<String> {
    items.iter().map(|i| i.id.to_string()).collect()
}

proptest! {
    #[test]
    fn prop_fresh_session_sees_every_item(ds in arb_dataset()) {
        let engine = NarrowingEngine::new(Arc::new(ds));
        let session = engine.new_session();
        let all = engine.get_candidates(&session, usize::MAX);
        prop_assert_eq!(all.len(), engine.dataset().item_count());

        let bounded = engine.get_candidates(&session, 3);
        prop_assert_eq!(bounded.len(), engine.dataset().item_count().min(3));
    }

    #[test]
    fn prop_candidates_sound_and_complete(ds in arb_dataset(), answers in arb_answers()) {
        let engine = NarrowingEngine::new(Arc::new(ds));
        let session = answer_all(&engine, &answers);

        let got = ids(&engine.get_candidates(&session, usize::MAX));
        let expected: Vec<String> = engine
            .dataset()
            .items()
            .iter()
            .filter(|item| session.required().iter().all(|t| item.trait_ids.contains(t)))
            .filter(|item| session.excluded().iter().all(|t| !item.trait_ids.contains(t)))
            .map(|item| item.id.to_string())
            .collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_next_question_not_answered(ds in arb_dataset(), answers in arb_answers()) {
        let engine = NarrowingEngine::new(Arc::new(ds));
        let session = answer_all(&engine, &answers);
        if let Some(t) = engine.get_next_question(&session) {
            prop_assert!(!session.ignored().contains(&t.id));
            prop_assert!(!session.excluded().contains(&t.id));
        }
    }

    #[test]
    fn prop_none_iff_nothing_discriminates(ds in arb_dataset(), answers in arb_answers()) {
        let engine = NarrowingEngine::new(Arc::new(ds));
        let session = answer_all(&engine, &answers);
        let remaining = engine.get_candidates(&session, usize::MAX);
        let askable = remaining
            .iter()
            .flat_map(|item| item.trait_ids.iter())
            .any(|t| !session.is_answered(t.as_str()));
        prop_assert_eq!(engine.get_next_question(&session).is_none(), !askable);
    }

    #[test]
    fn prop_queries_are_idempotent(ds in arb_dataset(), answers in arb_answers()) {
        let engine = NarrowingEngine::new(Arc::new(ds));
        let session = answer_all(&engine, &answers);
        prop_assert_eq!(
            ids(&engine.get_candidates(&session, 5)),
            ids(&engine.get_candidates(&session, 5))
        );
        prop_assert_eq!(
            engine.get_next_question(&session).map(|t| t.id.clone()),
            engine.get_next_question(&session).map(|t| t.id.clone())
        );
    }

    #[test]
    fn prop_answers_only_shrink_candidates(ds in arb_dataset(), answers in arb_answers()) {
        let engine = NarrowingEngine::new(Arc::new(ds));
        let mut session = engine.new_session();
        let mut previous: BTreeSet<String> =
            ids(&engine.get_candidates(&session, usize::MAX)).into_iter().collect();
        for (t, answer) in &answers {
            let _ = engine.record_answer(&mut session, &format!("T{t}"), *answer);
            let current: BTreeSet<String> =
                ids(&engine.get_candidates(&session, usize::MAX)).into_iter().collect();
            prop_assert!(current.is_subset(&previous));
            previous = current;
        }
    }
}
