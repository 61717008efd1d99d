// LMDB mirror of the dataset as three relations: traits, items and the
// item/trait pairs, so the relation can be queried without loading it.
use anyhow::{anyhow, Result};
use heed::types::{Bytes, Str, Unit};
use heed::{Database, Env, EnvOpenOptions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tropex_core::{Dataset, Item, ItemId, Trait, TraitId};

const DB_TRAITS: &str = "traits";
const DB_ITEMS: &str = "items";
const DB_ITEM_TRAITS: &str = "item_traits";

// Separates item id from trait id in item_traits keys
const PAIR_SEP: char = '\u{0}';

#[derive(Debug, Serialize, Deserialize)]
struct TraitRow {
    name: String,
    description: String,
    url: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ItemRow {
    name: String,
    url: String,
}

fn pair_key(item_id: &str, trait_id: &str) -> String {
    format!("{}{}{}", item_id, PAIR_SEP, trait_id)
}

pub struct LmdbStorage {
    env: Arc<Env>,
    traits_db: Database<Str, Bytes>,
    items_db: Database<Str, Bytes>,
    item_traits_db: Database<Str, Unit>,
}

impl LmdbStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        std::fs::create_dir_all(&path)?;

        let env = Arc::new(
            unsafe {
                EnvOpenOptions::new()
                    .map_size(4 * 1024 * 1024 * 1024) // 4GB
                    .max_dbs(4)
                    .open(path)?
            }
        );

        let mut wtxn = env.write_txn()?;

        let traits_db = env
            .create_database(&mut wtxn, Some(DB_TRAITS))?;

        let items_db = env
            .create_database(&mut wtxn, Some(DB_ITEMS))?;

        let item_traits_db = env
            .create_database(&mut wtxn, Some(DB_ITEM_TRAITS))?;

        wtxn.commit()?;

        Ok(Self {
            env,
            traits_db,
            items_db,
            item_traits_db,
        })
    }

    /// Replace the stored relation with `dataset` in one transaction
    pub fn save_dataset(&self, dataset: &Dataset) -> Result<()> {
        let mut wtxn = self.env.write_txn()?;
        self.traits_db.clear(&mut wtxn)?;
        self.items_db.clear(&mut wtxn)?;
        self.item_traits_db.clear(&mut wtxn)?;

        for t in dataset.traits() {
            let row = TraitRow {
                name: t.name.clone(),
                description: t.description.clone(),
                url: t.url.clone(),
            };
            let data = bincode::serialize(&row)
                .map_err(|e| anyhow!("Serialization error: {}", e))?;
            self.traits_db.put(&mut wtxn, t.id.as_str(), &data)?;
        }

        for item in dataset.items() {
            let row = ItemRow {
                name: item.name.clone(),
                url: item.url.clone(),
            };
            let data = bincode::serialize(&row)
                .map_err(|e| anyhow!("Serialization error: {}", e))?;
            self.items_db.put(&mut wtxn, item.id.as_str(), &data)?;
            for trait_id in &item.trait_ids {
                self.item_traits_db
                    .put(&mut wtxn, &pair_key(item.id.as_str(), trait_id.as_str()), &())?;
            }
        }

        wtxn.commit()?;
        Ok(())
    }

    /// Rebuild a dataset from the stored relation; `None` if nothing is stored
    pub fn load_dataset(&self) -> Result<Option<Dataset>> {
        let rtxn = self.env.read_txn()?;
        if self.traits_db.is_empty(&rtxn)? && self.items_db.is_empty(&rtxn)? {
            return Ok(None);
        }

        let mut traits = Vec::new();
        for result in self.traits_db.iter(&rtxn)? {
            let (id, data) = result?;
            let row: TraitRow = bincode::deserialize(data)
                .map_err(|e| anyhow!("Deserialization error: {}", e))?;
            traits.push(
                Trait::new(id, row.name)
                    .with_description(row.description)
                    .with_url(row.url),
            );
        }

        let mut items: BTreeMap<ItemId, Item> = BTreeMap::new();
        for result in self.items_db.iter(&rtxn)? {
            let (id, data) = result?;
            let row: ItemRow = bincode::deserialize(data)
                .map_err(|e| anyhow!("Deserialization error: {}", e))?;
            items.insert(ItemId::new(id), Item::new(id, row.name).with_url(row.url));
        }

        for result in self.item_traits_db.iter(&rtxn)? {
            let (key, ()) = result?;
            let (item_id, trait_id) = key
                .split_once(PAIR_SEP)
                .ok_or_else(|| anyhow!("malformed item_traits key {:?}", key))?;
            let item = items
                .get_mut(item_id)
                .ok_or_else(|| anyhow!("item_traits references unknown item {}", item_id))?;
            item.trait_ids.insert(TraitId::new(trait_id));
        }

        Ok(Some(Dataset::build(items.into_values().collect(), traits)?))
    }

    pub fn get_trait(&self, trait_id: &str) -> Result<Option<Trait>> {
        let rtxn = self.env.read_txn()?;
        match self.traits_db.get(&rtxn, trait_id)? {
            Some(data) => {
                let row: TraitRow = bincode::deserialize(data)
                    .map_err(|e| anyhow!("Deserialization error: {}", e))?;
                Ok(Some(
                    Trait::new(trait_id, row.name)
                        .with_description(row.description)
                        .with_url(row.url),
                ))
            }
            None => Ok(None),
        }
    }

    /// Trait ids of one item, read straight from the pair relation
    pub fn traits_of(&self, item_id: &str) -> Result<Vec<TraitId>> {
        let rtxn = self.env.read_txn()?;
        let prefix = format!("{}{}", item_id, PAIR_SEP);
        let mut trait_ids = Vec::new();
        for result in self.item_traits_db.prefix_iter(&rtxn, &prefix)? {
            let (key, ()) = result?;
            trait_ids.push(TraitId::new(&key[prefix.len()..]));
        }
        Ok(trait_ids)
    }

    pub fn relation_count(&self) -> Result<u64> {
        let rtxn = self.env.read_txn()?;
        Ok(self.item_traits_db.len(&rtxn)?)
    }
}
