use std::fs;
use std::path::{Path, PathBuf};

use tempfile::tempdir;

use super::scan::{collect_audio_files, is_audio_file, read_track_metadata};
use super::*;
use crate::config::{BuiltinTrack, LibrarySettings};

fn exts() -> Vec<String> {
    vec!["mp3".into(), "flac".into(), "wav".into(), "ogg".into()]
}

fn builtin(id: u32, title: &str, resource: &str) -> BuiltinTrack {
    BuiltinTrack {
        id,
        title: title.into(),
        artist: "House Band".into(),
        duration_ms: 200_000,
        resource: resource.into(),
    }
}

fn catalog_in(data_dir: &Path) -> Catalog {
    let settings = LibrarySettings {
        builtin: vec![builtin(1, "Morning Drive", "morning_drive"), builtin(2, "Night Highway", "night_highway")],
        ..LibrarySettings::default()
    };
    Catalog::new(data_dir, &settings, &exts())
}

fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn format_duration_pads_minutes_and_seconds() {
    assert_eq!(format_duration(0), "00:00");
    assert_eq!(format_duration(5_999), "00:05");
    assert_eq!(format_duration(185_000), "03:05");
    assert_eq!(format_duration(3_600_000), "60:00");
}

#[test]
fn format_size_picks_unit() {
    assert_eq!(format_size(512), "512 B");
    assert_eq!(format_size(1536), "1.5 KB");
    assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
}

#[test]
fn track_display_and_identity() {
    let a = Track {
        id: TrackId(7),
        title: "Song".into(),
        artist: "  ".into(),
        duration_ms: 1000,
        source: TrackSource::BuiltIn("song".into()),
    };
    assert_eq!(a.display(), "Song");
    assert!(a.is_builtin());

    let b = Track {
        artist: "Artist".into(),
        source: TrackSource::File(PathBuf::from("/tmp/song.mp3")),
        ..a.clone()
    };
    assert_eq!(b.display(), "Artist - Song");
    assert!(a.same_identity(&b));

    let c = Track {
        title: "Other".into(),
        ..a.clone()
    };
    assert!(!a.same_identity(&c));
}

#[test]
fn is_audio_file_matches_configured_extensions_case_insensitive() {
    let exts = exts();
    assert!(is_audio_file(Path::new("/tmp/a.mp3"), &exts));
    assert!(is_audio_file(Path::new("/tmp/a.MP3"), &exts));
    assert!(is_audio_file(Path::new("/tmp/a.flac"), &exts));
    assert!(!is_audio_file(Path::new("/tmp/a.txt"), &exts));
    assert!(!is_audio_file(Path::new("/tmp/a"), &exts));
    assert!(is_audio_file(Path::new("/tmp/a.ogg"), &[".OGG".to_string()]));
}

#[test]
fn collect_audio_files_respects_recursive_flag() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "root.mp3", b"x");
    write_file(dir.path(), "notes.txt", b"x");
    let sub = dir.path().join("sub");
    fs::create_dir_all(&sub).unwrap();
    write_file(&sub, "child.ogg", b"x");

    let all = collect_audio_files(dir.path(), &LibrarySettings::default(), &exts());
    assert_eq!(all.len(), 2);

    let flat = LibrarySettings {
        recursive: false,
        ..LibrarySettings::default()
    };
    let top = collect_audio_files(dir.path(), &flat, &exts());
    assert_eq!(top, vec![dir.path().join("root.mp3")]);
}

#[test]
fn metadata_defaults_when_tags_are_unreadable() {
    let dir = tempdir().unwrap();
    let path = write_file(dir.path(), "Highway Song.mp3", b"not really audio");

    let meta = read_track_metadata(&path);
    assert_eq!(meta.title, "Highway Song");
    assert_eq!(meta.artist, UNKNOWN_ARTIST);
    assert_eq!(meta.duration_ms, UNKNOWN_DURATION_MS);
}

#[test]
fn import_store_round_trips_camel_case_json() {
    let dir = tempdir().unwrap();
    let store = ImportStore::new(dir.path().join("nested").join("imported_music.json"));
    assert!(store.load().is_empty());

    let records = vec![ImportRecord {
        id: Some(FIRST_IMPORTED_ID),
        file_name: "a.mp3".into(),
        file_path: PathBuf::from("/data/imported_music/a.mp3"),
        file_size: 42,
    }];
    store.save(&records).unwrap();

    let raw = fs::read_to_string(store.path()).unwrap();
    assert!(raw.contains("\"fileName\""));
    assert!(raw.contains("\"filePath\""));
    assert!(raw.contains("\"fileSize\""));
    assert!(raw.contains("\"id\": 100"));
    assert_eq!(store.load(), records);
}

#[test]
fn import_store_treats_corrupt_file_as_empty() {
    let dir = tempdir().unwrap();
    let path = write_file(dir.path(), "imported_music.json", b"{ not json");
    assert!(ImportStore::new(path).load().is_empty());
}

#[test]
fn catalog_lists_builtin_tracks_first_then_imports_from_id_100() {
    let data = tempdir().unwrap();
    let src = tempdir().unwrap();
    let mut catalog = catalog_in(data.path());

    let first = catalog
        .import_file(&write_file(src.path(), "Drive.mp3", b"one"))
        .unwrap();
    let second = catalog
        .import_file(&write_file(src.path(), "Cruise.ogg", b"two"))
        .unwrap();
    assert_eq!(first.id, TrackId(FIRST_IMPORTED_ID));
    assert_eq!(second.id, TrackId(FIRST_IMPORTED_ID + 1));
    assert_eq!(first.title, "Drive");
    assert_eq!(
        first.source,
        TrackSource::File(data.path().join("imported_music").join("Drive.mp3"))
    );

    let tracks = catalog.load_catalog();
    let ids: Vec<u32> = tracks.iter().map(|t| t.id.0).collect();
    assert_eq!(ids, vec![1, 2, 100, 101]);
    assert_eq!(tracks[0].source, TrackSource::BuiltIn("morning_drive".into()));

    let records = catalog.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].file_name, "Drive.mp3");
    assert_eq!(records[0].file_size, 3);
}

#[test]
fn import_rejects_duplicate_names_case_insensitively() {
    let data = tempdir().unwrap();
    let src = tempdir().unwrap();
    let mut catalog = catalog_in(data.path());

    catalog
        .import_file(&write_file(src.path(), "Drive.mp3", b"one"))
        .unwrap();

    let other = tempdir().unwrap();
    let err = catalog
        .import_file(&write_file(other.path(), "DRIVE.MP3", b"again"))
        .unwrap_err();
    assert!(matches!(err, ImportError::Duplicate(name) if name == "DRIVE.MP3"));

    let err = catalog
        .import_file(&write_file(src.path(), "Morning_Drive.ogg", b"x"))
        .unwrap_err();
    assert!(matches!(err, ImportError::Duplicate(_)));
    assert_eq!(catalog.records().len(), 1);
}

#[test]
fn import_rejects_missing_source() {
    let data = tempdir().unwrap();
    let mut catalog = catalog_in(data.path());
    let err = catalog
        .import_file(Path::new("/definitely/not/here.mp3"))
        .unwrap_err();
    assert!(matches!(err, ImportError::Unreadable { .. }));
    assert!(catalog.records().is_empty());
}

#[test]
fn catalog_skips_imports_whose_file_disappeared() {
    let data = tempdir().unwrap();
    let src = tempdir().unwrap();
    let mut catalog = catalog_in(data.path());

    let gone = catalog
        .import_file(&write_file(src.path(), "gone.mp3", b"1"))
        .unwrap();
    catalog
        .import_file(&write_file(src.path(), "kept.mp3", b"2"))
        .unwrap();

    let TrackSource::File(path) = &gone.source else {
        panic!("imported track should be a file");
    };
    fs::remove_file(path).unwrap();

    let tracks = catalog.load_catalog();
    assert_eq!(tracks.len(), 3);
    assert_eq!(tracks[2].title, "kept");
    assert_eq!(tracks[2].id, TrackId(FIRST_IMPORTED_ID + 1));
}

#[test]
fn removing_an_import_keeps_the_other_ids() {
    let data = tempdir().unwrap();
    let src = tempdir().unwrap();
    let mut catalog = catalog_in(data.path());
    for name in ["a.mp3", "b.mp3", "c.mp3"] {
        catalog.import_file(&write_file(src.path(), name, b"x")).unwrap();
    }
    let before = catalog.load_catalog();
    let c = before.iter().find(|t| t.title == "c").unwrap().clone();
    assert_eq!(c.id, TrackId(FIRST_IMPORTED_ID + 2));

    catalog.remove_import("a.mp3").unwrap();
    let after = catalog.load_catalog();
    let c_again = after.iter().find(|t| t.title == "c").unwrap();
    assert!(c_again.same_identity(&c));

    // New imports never take an id that is still in use.
    let d = catalog.import_file(&write_file(src.path(), "d.mp3", b"x")).unwrap();
    assert_eq!(d.id, TrackId(FIRST_IMPORTED_ID + 3));
}

#[test]
fn records_without_ids_get_stable_ones() {
    let data = tempdir().unwrap();
    let storage = data.path().join("imported_music");
    fs::create_dir_all(&storage).unwrap();
    let a = write_file(&storage, "a.mp3", b"a");
    let b = write_file(&storage, "b.mp3", b"b");
    let legacy = format!(
        r#"[{{"fileName":"a.mp3","filePath":{a:?},"fileSize":1}},{{"id":105,"fileName":"b.mp3","filePath":{b:?},"fileSize":1}}]"#,
        a = a.to_str().unwrap(),
        b = b.to_str().unwrap(),
    );
    fs::write(data.path().join("imported_music.json"), legacy).unwrap();

    let catalog = catalog_in(data.path());
    let ids: Vec<u32> = catalog.load_catalog().iter().map(|t| t.id.0).collect();
    assert_eq!(ids, vec![1, 2, 106, 105]);

    // The assignment was written back, so a fresh catalog agrees.
    let stored = ImportStore::new(catalog.records_path()).load();
    assert_eq!(stored[0].id, Some(106));
    assert_eq!(catalog_in(data.path()).load_catalog()[2].id, TrackId(106));
}

#[test]
fn import_dir_imports_each_audio_file() {
    let data = tempdir().unwrap();
    let src = tempdir().unwrap();
    write_file(src.path(), "a.mp3", b"a");
    write_file(src.path(), "b.flac", b"b");
    write_file(src.path(), "cover.jpg", b"c");

    let mut catalog = catalog_in(data.path());
    let results = catalog.import_dir(src.path());
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|(_, r)| r.is_ok()));
    assert_eq!(catalog.load_catalog().len(), 4);
}

#[test]
fn remove_import_deletes_copy_and_record() {
    let data = tempdir().unwrap();
    let src = tempdir().unwrap();
    let mut catalog = catalog_in(data.path());
    catalog
        .import_file(&write_file(src.path(), "a.mp3", b"a"))
        .unwrap();
    let copy = data.path().join("imported_music").join("a.mp3");
    assert!(copy.exists());

    catalog.remove_import("A.mp3").unwrap();
    assert!(!copy.exists());
    assert!(catalog.records().is_empty());
}

#[test]
fn remove_import_drops_record_even_if_copy_is_missing() {
    let data = tempdir().unwrap();
    let src = tempdir().unwrap();
    let mut catalog = catalog_in(data.path());
    catalog
        .import_file(&write_file(src.path(), "a.mp3", b"a"))
        .unwrap();
    fs::remove_file(data.path().join("imported_music").join("a.mp3")).unwrap();

    catalog.remove_import("a.mp3").unwrap();
    assert!(catalog.records().is_empty());
}

#[test]
fn remove_import_refuses_builtin_and_unknown_names() {
    let data = tempdir().unwrap();
    let mut catalog = catalog_in(data.path());
    assert!(matches!(
        catalog.remove_import("morning_drive"),
        Err(ImportError::BuiltIn)
    ));
    assert!(matches!(
        catalog.remove_import("nothing.mp3"),
        Err(ImportError::NotFound(_))
    ));
}
