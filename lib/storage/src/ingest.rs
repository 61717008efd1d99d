// Ingestion of tvtropes-style CSV exports into a validated Dataset.
//
// Trait file columns:  _, trope id, camel-cased label, description
// Media file columns:  _, camel-cased title, _, _, trope id, media id
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tropex_core::{Dataset, Item, ItemId, Trait, TraitId};

const TRAIT_URL_PREFIX: &str = "https://tvtropes.org/pmwiki/pmwiki.php/Main/";
const ITEM_URL_PREFIX: &str = "https://tvtropes.org/pmwiki/pmwiki.php/Series/";

const MIN_TRAIT_FIELDS: usize = 3;
const MIN_MEDIA_FIELDS: usize = 6;

/// Insert a space before every uppercase ASCII letter that does not start
/// the label: `ChekhovsGun` -> `Chekhovs Gun`
pub fn split_camel_case(label: &str) -> String {
    let mut out = String::with_capacity(label.len() + 8);
    for (i, c) in label.chars().enumerate() {
        if i > 0 && c.is_ascii_uppercase() && !out.ends_with(' ') {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

fn reference_url(prefix: &str, label: &str) -> String {
    format!("{}{}", prefix, urlencoding::encode(label))
}

fn csv_reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .comment(Some(b'#'))
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))
}

/// Parse the trait (trope) file. Short or unreadable rows are skipped.
pub fn read_traits(path: &Path) -> Result<Vec<Trait>> {
    let mut reader = csv_reader(path)?;
    let mut traits = Vec::new();
    let mut skipped = 0usize;

    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                debug!("skipping unreadable row in {}: {}", path.display(), e);
                skipped += 1;
                continue;
            }
        };
        if record.len() < MIN_TRAIT_FIELDS {
            skipped += 1;
            continue;
        }
        let label = &record[2];
        traits.push(
            Trait::new(&record[1], split_camel_case(label))
                .with_description(record.get(3).unwrap_or_default())
                .with_url(reference_url(TRAIT_URL_PREFIX, label)),
        );
    }

    if skipped > 0 {
        warn!("{}: skipped {} malformed trait rows", path.display(), skipped);
    }
    Ok(traits)
}

/// Parse one media file; rows for the same media id are merged.
pub fn read_media(path: &Path) -> Result<Vec<Item>> {
    let mut reader = csv_reader(path)?;
    let mut items: BTreeMap<String, Item> = BTreeMap::new();
    let mut skipped = 0usize;

    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                debug!("skipping unreadable row in {}: {}", path.display(), e);
                skipped += 1;
                continue;
            }
        };
        if record.len() < MIN_MEDIA_FIELDS {
            skipped += 1;
            continue;
        }
        let title = &record[1];
        let trait_id = &record[4];
        let media_id = &record[5];

        items
            .entry(media_id.to_string())
            .or_insert_with(|| {
                Item::new(media_id, split_camel_case(title))
                    .with_url(reference_url(ITEM_URL_PREFIX, title))
            })
            .trait_ids
            .insert(TraitId::from(trait_id));
    }

    if skipped > 0 {
        warn!("{}: skipped {} malformed media rows", path.display(), skipped);
    }
    Ok(items.into_values().collect())
}

/// Build a dataset from a trait file and any number of media files.
///
/// Media files are parsed in parallel; the dataset is only assembled once
/// every file has been read. Relations to traits missing from the trait file
/// are dropped so `Dataset::build` receives a consistent relation.
pub fn ingest(traits_path: &Path, media_paths: &[PathBuf]) -> Result<Dataset> {
    let traits = read_traits(traits_path)?;
    info!("Processed trait file {:?}: {} traits", traits_path, traits.len());

    let per_file: Vec<Vec<Item>> = media_paths
        .par_iter()
        .map(|path| {
            debug!("Reading {:?}", path);
            let items = read_media(path)?;
            info!("Finished processing {:?}: {} items", path, items.len());
            Ok(items)
        })
        .collect::<Result<_>>()?;

    assemble(traits, per_file.into_iter().flatten())
}

/// Merge parsed rows into a dataset: first trait definition wins, items seen
/// in several sources merge their trait sets, unknown trait references drop.
pub fn assemble(traits: Vec<Trait>, items: impl IntoIterator<Item = Item>) -> Result<Dataset> {
    let mut unique_traits: BTreeMap<TraitId, Trait> = BTreeMap::new();
    let mut duplicate_traits = 0usize;
    for t in traits {
        if unique_traits.contains_key(&t.id) {
            duplicate_traits += 1;
            continue;
        }
        unique_traits.insert(t.id.clone(), t);
    }
    if duplicate_traits > 0 {
        warn!("ignored {} duplicate trait definitions", duplicate_traits);
    }

    let mut merged: BTreeMap<ItemId, Item> = BTreeMap::new();
    for item in items {
        match merged.get_mut(&item.id) {
            Some(existing) => existing.trait_ids.extend(item.trait_ids),
            None => {
                merged.insert(item.id.clone(), item);
            }
        }
    }

    let mut dropped = 0usize;
    let items: Vec<Item> = merged
        .into_values()
        .map(|mut item| {
            let before = item.trait_ids.len();
            let kept: BTreeSet<TraitId> = item
                .trait_ids
                .into_iter()
                .filter(|id| unique_traits.contains_key(id))
                .collect();
            dropped += before - kept.len();
            item.trait_ids = kept;
            item
        })
        .collect();
    if dropped > 0 {
        warn!("dropped {} relations to unknown traits", dropped);
    }

    let dataset = Dataset::build(items, unique_traits.into_values().collect())
        .context("assembling dataset")?;
    info!(
        "Dataset assembled: {} items, {} traits, {} relations",
        dataset.item_count(),
        dataset.trait_count(),
        dataset.relation_count()
    );
    Ok(dataset)
}
