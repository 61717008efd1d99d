// Integration tests for tropex
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tropex_core::{Answer, Dataset, Error, Item, NarrowingEngine, SessionPhase, Trait};
use tropex_storage::{LmdbStorage, SnapshotManager, StorageConfig, StorageManager};

fn scenario_engine() -> NarrowingEngine {
    let dataset = Dataset::build(
        vec![
            Item::new("A", "Item A").with_traits(["T1", "T2"]),
            Item::new("B", "Item B").with_trait("T2"),
            Item::new("C", "Item C").with_trait("T3"),
        ],
        vec![Trait::new("T1", "T1"), Trait::new("T2", "T2"), Trait::new("T3", "T3")],
    )
    .unwrap();
    NarrowingEngine::new(Arc::new(dataset))
}

fn candidate_ids(engine: &NarrowingEngine, session: &tropex_core::Session) -> Vec<String> {
    engine
        .get_candidates(session, 20)
        .iter()
        .map(|i| i.id.to_string())
        .collect()
}

fn write_csv(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

fn write_sources(dir: &Path) -> (PathBuf, Vec<PathBuf>) {
    let tropes = write_csv(
        dir,
        "tropes.csv",
        "idx,id,trope,description\n\
         0,t1,ChosenOne,\"Destined, special\"\n\
         1,t2,MentorOccupationalHazard,Mentors die\n\
         2,t3,SpaceWestern,Cowboys in space\n",
    );
    let film = write_csv(
        dir,
        "film_tropes.csv",
        "idx,title,a,b,trope_id,media_id\n\
         0,TheMatrix,_,_,t1,f1\n\
         1,TheMatrix,_,_,t2,f1\n\
         2,StarWars,_,_,t1,f2\n\
         3,StarWars,_,_,t2,f2\n\
         4,StarWars,_,_,t3,f2\n",
    );
    let tv = write_csv(
        dir,
        "tv_tropes.csv",
        "idx,title,a,b,trope_id,media_id\n\
         0,Firefly,_,_,t3,s1\n",
    );
    (tropes, vec![film, tv])
}

#[test]
fn test_scenario_yes_narrows_to_holder() {
    let engine = scenario_engine();
    let mut session = engine.new_session();
    engine.record_answer(&mut session, "T1", Answer::Yes).unwrap();
    assert_eq!(candidate_ids(&engine, &session), ["A"]);
}

#[test]
fn test_scenario_no_excludes_holders() {
    let engine = scenario_engine();
    let mut session = engine.new_session();
    engine.record_answer(&mut session, "T2", Answer::No).unwrap();
    assert_eq!(candidate_ids(&engine, &session), ["C"]);
}

#[test]
fn test_scenario_next_question_prefers_common_trait() {
    let engine = scenario_engine();
    let mut session = engine.new_session();
    engine.record_answer(&mut session, "T3", Answer::No).unwrap();
    assert_eq!(candidate_ids(&engine, &session), ["A", "B"]);
    assert_eq!(engine.get_next_question(&session).unwrap().id.as_str(), "T2");
}

#[test]
fn test_full_conversation_until_exhausted() {
    let engine = scenario_engine();
    let mut session = engine.new_session();
    let mut asked = Vec::new();

    while let Some(question) = engine.get_next_question(&session) {
        let id = question.id.to_string();
        let answer = if id == "T3" { Answer::No } else { Answer::DontCare };
        engine.record_answer(&mut session, &id, answer).unwrap();
        asked.push(id);
    }

    assert_eq!(asked, ["T2", "T1", "T3"]);
    assert_eq!(engine.phase(&session, 1), SessionPhase::Exhausted);
    assert_eq!(candidate_ids(&engine, &session), ["A", "B"]);
}

#[test]
fn test_dataset_sharing_across_threads() {
    let engine = scenario_engine();
    let handles: Vec<_> = ["T1", "T2", "T3"]
        .into_iter()
        .map(|t| {
            let engine = engine.clone();
            std::thread::spawn(move || {
                let mut session = engine.new_session();
                engine.record_answer(&mut session, t, Answer::Yes).unwrap();
                engine.get_candidates(&session, 20).len()
            })
        })
        .collect();
    let counts: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(counts, [1, 2, 1]);
}

#[test]
fn test_ingest_then_narrow() {
    let dir = tempfile::tempdir().unwrap();
    let (tropes, media) = write_sources(dir.path());
    let dataset = tropex_storage::ingest(&tropes, &media).unwrap();

    assert_eq!(dataset.item_count(), 3);
    assert_eq!(dataset.trait_count(), 3);
    assert_eq!(dataset.item("f2").unwrap().name, "Star Wars");
    assert_eq!(dataset.trait_by_id("t2").unwrap().name, "Mentor Occupational Hazard");

    let engine = NarrowingEngine::new(Arc::new(dataset));
    let mut session = engine.new_session();
    engine.record_answer(&mut session, "t3", Answer::Yes).unwrap();
    assert_eq!(candidate_ids(&engine, &session), ["f2", "s1"]);
    engine.record_answer(&mut session, "t1", Answer::No).unwrap();
    assert_eq!(candidate_ids(&engine, &session), ["s1"]);
}

#[test]
fn test_storage_manager_ingests_once() {
    let dir = tempfile::tempdir().unwrap();
    let (tropes, media) = write_sources(dir.path());
    let data_dir = dir.path().join("data");

    let storage = StorageManager::open(StorageConfig {
        data_dir: data_dir.clone(),
        traits_file: Some(tropes.clone()),
        media_files: media,
        use_lmdb: true,
        rebuild: false,
    })
    .unwrap();
    assert_eq!(storage.dataset().item_count(), 3);
    assert_eq!(storage.lmdb().unwrap().relation_count().unwrap(), 6);
    drop(storage);

    // Sources gone: the snapshot must be enough
    std::fs::remove_file(&tropes).unwrap();
    let storage = StorageManager::open(StorageConfig {
        data_dir: data_dir.clone(),
        traits_file: None,
        media_files: Vec::new(),
        use_lmdb: true,
        rebuild: false,
    })
    .unwrap();
    assert_eq!(storage.dataset().item_count(), 3);
    assert_eq!(storage.dataset().relation_count(), 6);
    drop(storage);

    // Without the snapshot the LMDB mirror is used
    std::fs::remove_file(data_dir.join("dataset.bin")).unwrap();
    let storage = StorageManager::open(StorageConfig {
        data_dir,
        traits_file: None,
        media_files: Vec::new(),
        use_lmdb: true,
        rebuild: false,
    })
    .unwrap();
    assert_eq!(storage.dataset().trait_count(), 3);
    assert_eq!(storage.dataset().traits_of("f1").unwrap().len(), 2);
}

#[test]
fn test_storage_manager_without_sources_fails() {
    let dir = tempfile::tempdir().unwrap();
    let result = StorageManager::open(StorageConfig {
        data_dir: dir.path().join("data"),
        use_lmdb: false,
        ..StorageConfig::default()
    });
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}

#[test]
fn test_rebuild_ignores_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    let snapshots = SnapshotManager::new(&data_dir).unwrap();
    snapshots
        .save(&Dataset::build(vec![Item::new("old", "Old")], vec![]).unwrap())
        .unwrap();

    let (tropes, media) = write_sources(dir.path());
    let storage = StorageManager::open(StorageConfig {
        data_dir,
        traits_file: Some(tropes),
        media_files: media,
        use_lmdb: false,
        rebuild: true,
    })
    .unwrap();
    assert!(storage.dataset().item("old").is_none());
    assert_eq!(storage.dataset().item_count(), 3);

    let reloaded = snapshots.load().unwrap().unwrap();
    assert_eq!(reloaded.item_count(), 3);
}

#[test]
fn test_lmdb_mirror_keeps_relation_queryable() {
    let dir = tempfile::tempdir().unwrap();
    let (tropes, media) = write_sources(dir.path());
    let dataset = tropex_storage::ingest(&tropes, &media).unwrap();

    let store = LmdbStorage::new(dir.path().join("lmdb")).unwrap();
    store.save_dataset(&dataset).unwrap();
    let ids: Vec<String> = store.traits_of("f2").unwrap().iter().map(|t| t.to_string()).collect();
    assert_eq!(ids, ["t1", "t2", "t3"]);
    assert_eq!(
        store.get_trait("t1").unwrap().unwrap().description,
        "Destined, special"
    );
}

#[test]
fn test_snapshot_wins_over_sources_without_rebuild() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    SnapshotManager::new(&data_dir)
        .unwrap()
        .save(&Dataset::build(vec![Item::new("old", "Old")], vec![]).unwrap())
        .unwrap();

    let (tropes, media) = write_sources(dir.path());
    let storage = StorageManager::open(StorageConfig {
        data_dir,
        traits_file: Some(tropes),
        media_files: media,
        use_lmdb: false,
        rebuild: false,
    })
    .unwrap();
    assert!(storage.dataset().item("old").is_some());
    assert_eq!(storage.dataset().item_count(), 1);
}
