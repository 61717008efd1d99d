use crate::{Error, Item, ItemId, Result, Trait, TraitId};
use ahash::{AHashMap, AHashSet};
use std::collections::BTreeSet;

/// Immutable item/trait relation with lookups in both directions.
///
/// Built once with [`Dataset::build`]; nothing mutates it afterwards, so it
/// is shared across sessions behind an `Arc` without locking.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    // both sorted by id
    items: Vec<Item>,
    traits: Vec<Trait>,
    item_pos: AHashMap<ItemId, usize>,
    trait_pos: AHashMap<TraitId, usize>,
    // trait -> items possessing it; every known trait has an entry
    items_by_trait: AHashMap<TraitId, AHashSet<ItemId>>,
    relation_count: usize,
}

impl Dataset {
    /// Build the indices, rejecting duplicate ids and items that reference
    /// traits absent from `traits`.
    pub fn build(mut items: Vec<Item>, mut traits: Vec<Trait>) -> Result<Self> {
        traits.sort_by(|a, b| a.id.cmp(&b.id));
        items.sort_by(|a, b| a.id.cmp(&b.id));

        let mut trait_pos = AHashMap::with_capacity(traits.len());
        let mut items_by_trait: AHashMap<TraitId, AHashSet<ItemId>> =
            AHashMap::with_capacity(traits.len());
        for (pos, t) in traits.iter().enumerate() {
            if trait_pos.insert(t.id.clone(), pos).is_some() {
                return Err(Error::Validation(format!("duplicate trait id {}", t.id)));
            }
            items_by_trait.insert(t.id.clone(), AHashSet::new());
        }

        let mut item_pos = AHashMap::with_capacity(items.len());
        let mut relation_count = 0;
        for (pos, item) in items.iter().enumerate() {
            if item_pos.insert(item.id.clone(), pos).is_some() {
                return Err(Error::Validation(format!("duplicate item id {}", item.id)));
            }
            for trait_id in &item.trait_ids {
                let holders = items_by_trait.get_mut(trait_id).ok_or_else(|| {
                    Error::Validation(format!(
                        "item {} references unknown trait {}",
                        item.id, trait_id
                    ))
                })?;
                holders.insert(item.id.clone());
                relation_count += 1;
            }
        }

        tracing::debug!(
            items = items.len(),
            traits = traits.len(),
            relations = relation_count,
            "dataset indexed"
        );

        Ok(Self {
            items,
            traits,
            item_pos,
            trait_pos,
            items_by_trait,
            relation_count,
        })
    }

    /// Items possessing `trait_id`, `None` if the trait is unknown
    #[inline]
    pub fn items_with_trait(&self, trait_id: &str) -> Option<&AHashSet<ItemId>> {
        self.items_by_trait.get(trait_id)
    }

    /// Traits possessed by `item_id`, `None` if the item is unknown
    #[inline]
    pub fn traits_of(&self, item_id: &str) -> Option<&BTreeSet<TraitId>> {
        self.item(item_id).map(|item| &item.trait_ids)
    }

    #[inline]
    pub fn item(&self, item_id: &str) -> Option<&Item> {
        self.item_pos.get(item_id).map(|&pos| &self.items[pos])
    }

    #[inline]
    pub fn trait_by_id(&self, trait_id: &str) -> Option<&Trait> {
        self.trait_pos.get(trait_id).map(|&pos| &self.traits[pos])
    }

    #[inline]
    pub fn contains_trait(&self, trait_id: &str) -> bool {
        self.trait_pos.contains_key(trait_id)
    }

    /// All items in ascending id order
    #[inline]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// All traits in ascending id order
    #[inline]
    pub fn traits(&self) -> &[Trait] {
        &self.traits
    }

    #[inline]
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    #[inline]
    #[must_use]
    pub fn trait_count(&self) -> usize {
        self.traits.len()
    }

    /// Number of (item, trait) pairs
    #[inline]
    #[must_use]
    pub fn relation_count(&self) -> usize {
        self.relation_count
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.traits.is_empty()
    }
}
