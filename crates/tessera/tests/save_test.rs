//! Tests for saving datastores to disk and reopening them

use parking_lot::Mutex;
use std::fs;
use tessera::prelude::*;
use tessera::MultipageConfig;
use tempfile::TempDir;

fn image(time: u32, position: u32) -> Image {
    Image::new(
        Coords::builder().time(time).stage_position(position).build(),
        2,
        1,
        1,
        vec![time as u8, position as u8],
    )
}

fn populated_store(config: DatastoreConfig) -> Datastore {
    let store = Datastore::with_config(EventManager::new(), config);
    let ram = RamStorage::new(&store);
    store.set_storage(ram);

    store
        .set_summary_metadata(SummaryMetadata::builder().name("stage scan").build())
        .unwrap();
    for position in [2, 0, 1] {
        store.put_image(image(0, position)).unwrap();
    }
    store
}

#[test]
fn test_save_writes_positions_in_order() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("scan");

    // A combined frames file only accepts non-decreasing positions
    let config = DatastoreConfig::new()
        .with_multipage(MultipageConfig::default().with_split_positions(false));
    let store = populated_store(config);

    assert!(store.save(SaveMode::Multipage, &dir));

    let reopened = open_dataset(&dir).unwrap();
    let positions: Vec<_> = reopened
        .get_unordered_image_coords()
        .iter()
        .map(|c| c.index(axis::STAGE_POSITION))
        .collect();
    assert_eq!(positions, vec![Some(0), Some(1), Some(2)]);
}

#[test]
fn test_save_fills_intended_dimensions() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("scan");
    let store = populated_store(DatastoreConfig::default());

    let saved = store.save_to(SaveMode::Multipage, &dir).unwrap();

    let dims = saved
        .get_summary_metadata()
        .unwrap()
        .intended_dimensions()
        .cloned()
        .unwrap();
    assert_eq!(dims.index(axis::TIME), Some(1));
    assert_eq!(dims.index(axis::STAGE_POSITION), Some(3));

    // The source keeps the summary it had
    assert!(store
        .get_summary_metadata()
        .unwrap()
        .intended_dimensions()
        .is_none());
}

#[test]
fn test_save_freezes_both_datastores() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("scan");
    let store = populated_store(DatastoreConfig::default());

    let kinds = Arc::new(Mutex::new(Vec::new()));
    let sink = kinds.clone();
    store.register_fn(move |event| {
        sink.lock().push(event.kind());
        Ok(())
    });

    let saved = store.save_to(SaveMode::SinglePlaneSeries, &dir).unwrap();

    assert!(saved.is_frozen());
    assert_eq!(saved.save_path(), Some(dir.clone()));
    assert_eq!(saved.get_num_images(), Some(3));

    assert!(store.is_frozen());
    assert_eq!(store.save_path(), Some(dir));
    assert_eq!(*kinds.lock(), vec!["saved", "frozen"]);
}

#[test]
fn test_reopen_multipage() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("scan");
    let store = populated_store(DatastoreConfig::default());
    assert!(store.save(SaveMode::Multipage, &dir));

    assert!(dir.join("images_Pos0.frames").exists());
    assert!(dir.join("images_Pos2.frames").exists());

    let reopened = open_dataset(&dir).unwrap();
    assert_eq!(reopened.get_num_images(), 3);
    assert_eq!(
        reopened.get_image(image(0, 2).coords()),
        Some(image(0, 2))
    );
    let summary = reopened.get_summary_metadata().unwrap();
    assert_eq!(summary.name(), Some("stage scan"));
    assert_eq!(summary.axis_order().unwrap(), ["position"]);
}

#[test]
fn test_reopen_single_plane_series() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("planes");
    let store = populated_store(DatastoreConfig::default());
    assert!(store.save(SaveMode::SinglePlaneSeries, &dir));

    let reopened = open_dataset(&dir).unwrap();
    assert_eq!(reopened.get_num_images(), 3);
    for position in 0..3 {
        assert_eq!(
            reopened.get_image(image(0, position).coords()),
            Some(image(0, position))
        );
    }
    assert_eq!(reopened.get_max_index(axis::STAGE_POSITION), 2);
}

#[test]
fn test_reopened_dataset_can_back_a_datastore() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("scan");
    let store = populated_store(DatastoreConfig::default());
    assert!(store.save(SaveMode::Multipage, &dir));

    let viewer = Datastore::new(EventManager::new());
    viewer.set_storage(open_dataset(&dir).unwrap());
    assert_eq!(viewer.get_num_images(), Some(3));
    assert_eq!(viewer.get_axis_length(axis::STAGE_POSITION), 3);

    // Converting to the other layout goes through the same pipeline
    let converted = temp.path().join("planes");
    assert!(viewer.save(SaveMode::SinglePlaneSeries, &converted));
    assert_eq!(open_dataset(&converted).unwrap().get_num_images(), 3);
}

#[test]
fn test_save_into_non_empty_directory_fails() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("notes.txt"), "occupied").unwrap();
    let store = populated_store(DatastoreConfig::default());

    assert!(!store.save(SaveMode::Multipage, temp.path()));
    assert!(store.save_to(SaveMode::Multipage, temp.path()).is_err());

    assert!(!store.is_frozen());
    assert!(store.save_path().is_none());
    store.put_image(image(1, 0)).unwrap();
}

#[test]
fn test_save_empty_datastore() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("empty");
    let store = Datastore::new_in_memory(EventManager::new());

    let saved = store.save_to(SaveMode::Multipage, &dir).unwrap();
    assert_eq!(saved.get_num_images(), Some(0));
    assert!(store.is_frozen());

    let reopened = open_dataset(&dir).unwrap();
    assert_eq!(reopened.get_num_images(), 0);
}

#[test]
fn test_unrecognized_save_mode() {
    let err = "ome-zarr".parse::<SaveMode>().unwrap_err();
    assert!(matches!(err, TesseraError::UnrecognizedSaveMode(ref mode) if mode == "ome-zarr"));
}

fn plane(coords: Coords) -> Image {
    Image::new(coords, 1, 1, 1, vec![7u8])
}

#[test]
fn test_save_when_first_image_uses_fewer_axes() {
    let temp = TempDir::new().unwrap();
    let store = Datastore::new_in_memory(EventManager::new());
    store
        .put_image(plane(Coords::builder().time(0).stage_position(1).build()))
        .unwrap();
    store.put_image(plane(Coords::builder().time(1).build())).unwrap();

    // The image without a position is written first
    let saved = store
        .save_to(SaveMode::Multipage, temp.path().join("scan"))
        .unwrap();
    assert_eq!(saved.get_num_images(), Some(2));
    assert_eq!(saved.get_axes().unwrap().len(), 2);
}

#[test]
fn test_save_when_lower_position_uses_fewer_axes() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("planes");
    let store = Datastore::new_in_memory(EventManager::new());
    store
        .put_image(plane(Coords::builder().stage_position(1).channel(0).build()))
        .unwrap();
    store
        .put_image(plane(Coords::builder().stage_position(0).build()))
        .unwrap();

    assert!(store.save(SaveMode::SinglePlaneSeries, &dir));
    assert_eq!(open_dataset(&dir).unwrap().get_num_images(), 2);
}

#[test]
fn test_save_order_ties_keep_arrival_order() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("scan");
    let config = DatastoreConfig::new()
        .with_multipage(MultipageConfig::default().with_split_positions(false));
    let store = Datastore::with_config(EventManager::new(), config);
    let ram = RamStorage::new(&store);
    store.set_storage(ram);

    let arrivals = [
        Coords::builder().time(0).stage_position(1).build(),
        Coords::builder().time(0).stage_position(0).build(),
        Coords::builder().time(1).stage_position(1).build(),
        Coords::builder().time(1).stage_position(0).build(),
        Coords::builder().time(2).build(),
    ];
    for coords in &arrivals {
        store.put_image(plane(coords.clone())).unwrap();
    }

    assert!(store.save(SaveMode::Multipage, &dir));

    let written = open_dataset(&dir).unwrap().get_unordered_image_coords();
    let expected = vec![
        arrivals[4].clone(),
        arrivals[1].clone(),
        arrivals[3].clone(),
        arrivals[0].clone(),
        arrivals[2].clone(),
    ];
    assert_eq!(written, expected);
}

#[test]
fn test_read_only_dataset_refuses_writes() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("scan");
    let store = populated_store(DatastoreConfig::default());
    assert!(store.save(SaveMode::Multipage, &dir));

    let viewer = Datastore::new(EventManager::new());
    viewer.set_storage(open_dataset(&dir).unwrap());
    let kinds = Arc::new(Mutex::new(Vec::new()));
    let sink = kinds.clone();
    viewer.register_fn(move |event| {
        sink.lock().push(event.kind());
        Ok(())
    });

    let err = viewer.put_image(image(1, 0)).unwrap_err();
    assert!(matches!(err, TesseraError::InvalidState(_)));
    let err = viewer
        .set_summary_metadata(SummaryMetadata::default())
        .unwrap_err();
    assert!(matches!(err, TesseraError::InvalidState(_)));

    assert!(kinds.lock().is_empty());
    assert_eq!(viewer.get_num_images(), Some(3));
    assert!(!viewer.is_frozen());
}
