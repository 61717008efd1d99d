// Candidate filtering over the item/trait relation
use crate::{Dataset, Item, ItemId, Session, TraitId};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};

pub trait ItemFilter {
    fn matches(&self, item: &Item) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitCondition {
    Has(TraitId),
    Lacks(TraitId),
    And(Vec<TraitCondition>),
    Or(Vec<TraitCondition>),
    Not(Box<TraitCondition>),
}

impl TraitCondition {
    fn matches_item(&self, item: &Item) -> bool {
        match self {
            TraitCondition::Has(id) => item.trait_ids.contains(id),
            TraitCondition::Lacks(id) => !item.trait_ids.contains(id),
            TraitCondition::And(conditions) => conditions.iter().all(|c| c.matches_item(item)),
            TraitCondition::Or(conditions) => conditions.iter().any(|c| c.matches_item(item)),
            TraitCondition::Not(condition) => !condition.matches_item(item),
        }
    }

    /// Trait ids an item must possess for this condition to hold, if any.
    /// Used to start evaluation from a posting set instead of a full scan.
    fn must_have(&self) -> Vec<&TraitId> {
        match self {
            TraitCondition::Has(id) => vec![id],
            TraitCondition::And(conditions) => {
                conditions.iter().flat_map(|c| c.must_have()).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// Filter built from a [`TraitCondition`] tree
#[derive(Debug, Clone)]
pub struct TraitFilter {
    condition: TraitCondition,
}

impl TraitFilter {
    pub fn new(condition: TraitCondition) -> Self {
        Self { condition }
    }

    /// All of the session's Yes traits and none of its No traits
    pub fn for_session(session: &Session) -> Self {
        let conditions = session
            .required()
            .iter()
            .cloned()
            .map(TraitCondition::Has)
            .chain(session.excluded().iter().cloned().map(TraitCondition::Lacks))
            .collect();
        Self::new(TraitCondition::And(conditions))
    }

    pub fn condition(&self) -> &TraitCondition {
        &self.condition
    }

    /// Matching items in ascending id order, at most `limit` of them
    pub fn apply<'a>(&self, dataset: &'a Dataset, limit: Option<usize>) -> Vec<&'a Item> {
        let limit = limit.unwrap_or(usize::MAX);
        if limit == 0 {
            return Vec::new();
        }

        match self.seed(dataset) {
            Seed::All => dataset
                .items()
                .iter()
                .filter(|item| self.matches(item))
                .take(limit)
                .collect(),
            Seed::Nothing => Vec::new(),
            Seed::Postings(postings) => {
                let mut ids: Vec<&ItemId> = postings.iter().collect();
                ids.sort_unstable();
                ids.into_iter()
                    .filter_map(|id| dataset.item(id.as_str()))
                    .filter(|item| self.matches(item))
                    .take(limit)
                    .collect()
            }
        }
    }

    // Smallest posting set among the traits every match must have
    fn seed<'a>(&self, dataset: &'a Dataset) -> Seed<'a> {
        let must_have = self.condition.must_have();
        if must_have.is_empty() {
            return Seed::All;
        }
        let mut smallest: Option<&AHashSet<ItemId>> = None;
        for id in must_have {
            match dataset.items_with_trait(id.as_str()) {
                None => return Seed::Nothing,
                Some(postings) => {
                    if smallest.map_or(true, |s| postings.len() < s.len()) {
                        smallest = Some(postings);
                    }
                }
            }
        }
        smallest.map_or(Seed::All, Seed::Postings)
    }
}

enum Seed<'a> {
    All,
    Nothing,
    Postings(&'a AHashSet<ItemId>),
}

impl ItemFilter for TraitFilter {
    fn matches(&self, item: &Item) -> bool {
        self.condition.matches_item(item)
    }
}

/// Items consistent with every answer in `session`, ascending by id
pub fn candidates<'a>(dataset: &'a Dataset, session: &Session, limit: Option<usize>) -> Vec<&'a Item> {
    TraitFilter::for_session(session).apply(dataset, limit)
}
