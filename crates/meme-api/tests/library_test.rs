//! Library orchestration tests.
//!
//! Covers:
//! - Search visibility after add, edit and reindex
//! - Browse order and out-of-range pages
//! - Atomic commit operations, including under concurrency
//! - Persistence flags and storage failures
//! - Thumbnails for stored image media

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use meme_api::{Library, SearchOptions};
use meme_core::{
    DocumentStorage, Error, MediaStorage, MediaType, MemeUpdate, NewMeme, Page, RecordStore,
    Result,
};
use meme_db::{ImageThumbnailer, JsonRecordStore, LocalJsonFile, LocalMediaStorage};
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    db_path: std::path::PathBuf,
    media: Arc<LocalMediaStorage>,
    library: Library,
}

async fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("db.json");
    let store = Arc::new(JsonRecordStore::new(Arc::new(LocalJsonFile::new(&db_path))));
    store.load_db().await.unwrap();
    let media = Arc::new(LocalMediaStorage::new(
        dir.path().join("media"),
        "http://localhost:5000",
    ));
    let library = Library::new(store, media.clone());
    Fixture {
        _dir: dir,
        db_path,
        media,
        library,
    }
}

fn ids(memes: &[meme_core::MemeRecord]) -> Vec<u64> {
    memes.iter().map(|m| m.id).collect()
}

fn page(per_page: usize, page: usize) -> Page {
    Page::new(per_page, page).unwrap()
}

/// Library holding the two-meme reference catalog, with ids 1 and 2.
async fn reference_library() -> Fixture {
    let f = fixture().await;
    // Burn id 0 so the catalog ids match the reference scenario
    f.library
        .add_meme_to_library(NewMeme::new("placeholder", "png"), false)
        .await
        .unwrap();

    f.library
        .add_meme_to_library(
            NewMeme::new("doge meme", "jpg").with_tags(["dog", "funny"]),
            false,
        )
        .await
        .unwrap();
    f.library
        .add_meme_to_library(
            NewMeme::new("cat jam", "mp4").with_tags(["cat", "music"]),
            false,
        )
        .await
        .unwrap();
    f
}

// ========== REFERENCE SCENARIO ==========

#[tokio::test]
async fn test_reference_scenario() {
    let f = fixture().await;
    let lib = &f.library;
    let doge = lib
        .add_meme_to_library(NewMeme::new("doge meme", "jpg").with_tags(["dog", "funny"]), false)
        .await
        .unwrap();
    let cat = lib
        .add_meme_to_library(NewMeme::new("cat jam", "mp4").with_tags(["cat", "music"]), false)
        .await
        .unwrap();
    assert_eq!(doge.media_type, MediaType::Image);
    assert_eq!(cat.media_type, MediaType::Video);
    lib.index_library().await.unwrap();

    let found = lib.search("funny", SearchOptions::default()).await.unwrap();
    assert_eq!(ids(&found), vec![doge.id]);

    let found = lib
        .search("cat", SearchOptions::default().only(MediaType::Image))
        .await
        .unwrap();
    assert!(found.is_empty());

    assert_eq!(ids(&lib.browse_memes(page(1, 1)).await.unwrap()), vec![doge.id]);
    assert_eq!(ids(&lib.browse_memes(page(1, 2)).await.unwrap()), vec![cat.id]);
}

#[tokio::test]
async fn test_reference_catalog_with_ids_one_and_two() {
    let f = reference_library().await;
    f.library.index_library().await.unwrap();

    let found = f.library.search("funny", SearchOptions::default()).await.unwrap();
    assert_eq!(ids(&found), vec![1]);
    let found = f.library.search("music", SearchOptions::default()).await.unwrap();
    assert_eq!(ids(&found), vec![2]);
}

// ========== INDEX COMPLETENESS ==========

#[tokio::test]
async fn test_added_memes_found_by_name_after_reindex() {
    let f = fixture().await;
    let names = [
        "surprised pikachu",
        "distracted boyfriend",
        "drake hotline",
        "galaxy brain",
        "this is fine dog",
    ];
    let mut added = Vec::new();
    for name in names {
        added.push(
            f.library
                .add_meme_to_library(NewMeme::new(name, "png"), false)
                .await
                .unwrap(),
        );
    }
    f.library.index_library().await.unwrap();

    for meme in &added {
        let word = meme.name.rsplit(' ').next().unwrap();
        let found = f
            .library
            .search(word, SearchOptions::new(page(100, 1)))
            .await
            .unwrap();
        assert!(
            found.iter().any(|m| m.id == meme.id),
            "'{}' not found by '{}'",
            meme.name,
            word
        );
    }
}

#[tokio::test]
async fn test_every_indexed_add_is_searchable() {
    let f = fixture().await;
    f.library
        .add_meme_to_library(NewMeme::new("first frog", "png"), true)
        .await
        .unwrap();
    let second = f
        .library
        .add_meme_to_library(NewMeme::new("second toad", "png"), true)
        .await
        .unwrap();

    // No explicit reindex between adds
    let found = f.library.search("toad", SearchOptions::default()).await.unwrap();
    assert_eq!(ids(&found), vec![second.id]);
}

// ========== EDIT VISIBILITY ==========

#[tokio::test]
async fn test_edit_visible_after_save_and_reindex() {
    let f = fixture().await;
    let meme = f
        .library
        .add_meme_to_library(NewMeme::new("cat jam", "mp4").with_tags(["cat"]), true)
        .await
        .unwrap();

    f.library
        .edit_meme(meme.id, &MemeUpdate::tags(["x"]))
        .await
        .unwrap();
    // Reindex required: no visibility guarantee for "x" until index_library runs
    assert!(f.library.save_library().await);
    f.library.index_library().await.unwrap();

    let found = f.library.search("x", SearchOptions::default()).await.unwrap();
    assert_eq!(ids(&found), vec![meme.id]);
}

#[tokio::test]
async fn test_commit_edit_visible_immediately() {
    let f = fixture().await;
    let meme = f
        .library
        .add_meme_to_library(NewMeme::new("cat jam", "mp4").with_tags(["cat", "music"]), true)
        .await
        .unwrap();

    let edited = f
        .library
        .commit_edit(meme.id, &MemeUpdate::tags(["vibing"]))
        .await
        .unwrap();
    assert_eq!(edited.tags, vec!["vibing"]);
    assert_eq!(edited.name, "cat jam");

    let found = f.library.search("vibing", SearchOptions::default()).await.unwrap();
    assert_eq!(ids(&found), vec![meme.id]);
    // Still matches by name
    let found = f.library.search("cat", SearchOptions::default()).await.unwrap();
    assert_eq!(ids(&found), vec![meme.id]);
    // Replaced tag no longer matches
    let found = f
        .library
        .search("music", SearchOptions::default())
        .await
        .unwrap();
    assert!(found.is_empty());

    // Persisted
    let saved = std::fs::read_to_string(&f.db_path).unwrap();
    assert!(saved.contains("vibing"));
}

#[tokio::test]
async fn test_edit_missing_meme() {
    let f = fixture().await;
    let err = f
        .library
        .commit_edit(42, &MemeUpdate::name("nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MemeNotFound(42)));
    assert!(matches!(
        f.library.edit_meme(42, &MemeUpdate::name("nope")).await,
        Err(Error::MemeNotFound(42))
    ));
}

// ========== BROWSE ==========

#[tokio::test]
async fn test_browse_out_of_range_is_empty() {
    let f = reference_library().await;
    assert_eq!(f.library.browse_memes(page(2, 2)).await.unwrap().len(), 1);
    assert!(f.library.browse_memes(page(2, 3)).await.unwrap().is_empty());
    assert!(f.library.browse_memes(page(10, 2)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_search_out_of_range_is_empty() {
    let f = reference_library().await;
    f.library.index_library().await.unwrap();
    let found = f
        .library
        .search("funny", SearchOptions::new(page(1, 2)))
        .await
        .unwrap();
    assert!(found.is_empty());
}

// ========== COMMIT / PERSISTENCE ==========

#[tokio::test]
async fn test_commit_new_meme_persists_and_indexes() {
    let f = fixture().await;
    let meme = f
        .library
        .commit_new_meme(NewMeme::new("galaxy brain", "gif").with_tags(["smart"]))
        .await
        .unwrap();

    let found = f.library.search("smart", SearchOptions::default()).await.unwrap();
    assert_eq!(ids(&found), vec![meme.id]);

    // A fresh store over the same file sees the record
    let reopened = JsonRecordStore::new(Arc::new(LocalJsonFile::new(&f.db_path)));
    reopened.load_db().await.unwrap();
    assert_eq!(reopened.get_item(meme.id).await.unwrap().name, "galaxy brain");
}

#[tokio::test]
async fn test_concurrent_commits_are_all_searchable() {
    let f = fixture().await;
    let library = Arc::new(f.library);

    let mut handles = Vec::new();
    for i in 0..16 {
        let library = library.clone();
        handles.push(tokio::spawn(async move {
            library
                .commit_new_meme(NewMeme::new(format!("frog number {i}"), "png"))
                .await
                .unwrap()
        }));
    }
    let mut committed = Vec::new();
    for handle in handles {
        committed.push(handle.await.unwrap().id);
    }
    committed.sort();
    committed.dedup();
    assert_eq!(committed.len(), 16);

    let mut found = ids(&library
        .search("frog", SearchOptions::new(page(100, 1)))
        .await
        .unwrap());
    found.sort();
    assert_eq!(found, committed);
}

/// Document backend whose writes always fail.
struct FailingDocument;

#[async_trait]
impl DocumentStorage for FailingDocument {
    async fn read(&self) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }

    async fn write(&self, _data: &[u8]) -> Result<()> {
        Err(Error::Storage("disk full".to_string()))
    }

    fn location(&self) -> String {
        "failing".to_string()
    }
}

#[tokio::test]
async fn test_save_failure_reported() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(JsonRecordStore::new(Arc::new(FailingDocument)));
    store.load_db().await.unwrap();
    let media = Arc::new(LocalMediaStorage::new(dir.path(), "http://localhost"));
    let library = Library::new(store, media);

    library
        .add_meme_to_library(NewMeme::new("doge", "jpg"), true)
        .await
        .unwrap();
    assert!(!library.save_library().await);
    assert!(library.try_save_library().await.unwrap_err().is_storage());

    let err = library
        .commit_new_meme(NewMeme::new("cat", "mp4"))
        .await
        .unwrap_err();
    assert!(err.is_storage());
}

fn failing_library(dir: &TempDir) -> (Arc<JsonRecordStore>, Library) {
    let store = Arc::new(JsonRecordStore::new(Arc::new(FailingDocument)));
    let media = Arc::new(LocalMediaStorage::new(dir.path(), "http://localhost"));
    (store.clone(), Library::new(store, media))
}

#[tokio::test]
async fn test_failed_commit_new_meme_leaves_nothing_behind() {
    let dir = TempDir::new().unwrap();
    let (store, library) = failing_library(&dir);
    store.load_db().await.unwrap();

    // A client retrying a failed add must not produce duplicates
    for _ in 0..2 {
        let err = library
            .commit_new_meme(NewMeme::new("cat", "mp4"))
            .await
            .unwrap_err();
        assert!(err.is_storage());
    }

    assert_eq!(library.meme_count().await.unwrap(), 0);
    assert!(library
        .search("cat", SearchOptions::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_failed_commit_edit_restores_previous_record() {
    let dir = TempDir::new().unwrap();
    let (store, library) = failing_library(&dir);
    store.load_db().await.unwrap();
    let meme = library
        .add_meme_to_library(NewMeme::new("cat jam", "mp4").with_tags(["cat"]), true)
        .await
        .unwrap();

    let err = library
        .commit_edit(meme.id, &MemeUpdate::tags(["vibing"]))
        .await
        .unwrap_err();
    assert!(err.is_storage());

    assert_eq!(library.get_meme(meme.id).await.unwrap(), meme);
    assert!(library
        .search("vibing", SearchOptions::default())
        .await
        .unwrap()
        .is_empty());
    let found = library.search("cat", SearchOptions::default()).await.unwrap();
    assert_eq!(ids(&found), vec![meme.id]);
}

#[tokio::test]
async fn test_failed_attach_media_restores_previous_record() {
    let dir = TempDir::new().unwrap();
    let (store, library) = failing_library(&dir);
    store.load_db().await.unwrap();
    let meme = library
        .add_meme_to_library(NewMeme::new("pending", "gif"), true)
        .await
        .unwrap();

    assert!(library.attach_media(meme.id, b"GIF89a").await.is_err());

    assert_eq!(library.get_meme(meme.id).await.unwrap(), meme);
    let found = library.search("pending", SearchOptions::default()).await.unwrap();
    assert!(found[0].media_url.is_empty());
}

// ========== RELOAD ==========

#[tokio::test]
async fn test_reload_rebuilds_existing_index() {
    let f = fixture().await;
    let doge = f
        .library
        .commit_new_meme(NewMeme::new("doge meme", "jpg").with_tags(["dog"]))
        .await
        .unwrap();

    // Another writer replaces the document on disk
    std::fs::write(
        &f.db_path,
        format!(
            r#"{{"nextID": 1, "items": {{
                "{id}": {{"id": {id}, "name": "cat jam", "mediaType": "video", "fileExt": "mp4",
                         "tags": ["cat"], "mediaID": "", "mediaURL": "", "thumbnail": ""}}
            }}}}"#,
            id = doge.id
        ),
    )
    .unwrap();
    assert!(f.library.load_library().await);

    assert!(f
        .library
        .search("doge", SearchOptions::default())
        .await
        .unwrap()
        .is_empty());
    let found = f.library.search("cat", SearchOptions::default()).await.unwrap();
    assert_eq!(ids(&found), vec![doge.id]);
    assert_eq!(found[0].name, "cat jam");
}

#[tokio::test]
async fn test_reload_without_index_stays_unindexed() {
    let f = fixture().await;
    assert!(f.library.load_library().await);
    assert!(!f.library.has_index());
}

// ========== MEDIA ==========

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([10, 200, 10]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

#[tokio::test]
async fn test_add_and_upload_with_thumbnail() {
    let f = fixture().await;
    let store = Arc::new(JsonRecordStore::new(Arc::new(LocalJsonFile::new(&f.db_path))));
    store.init_db().await.unwrap();
    let library = Library::new(store, f.media.clone())
        .with_thumbnails(Arc::new(ImageThumbnailer::default()));

    let meme = library
        .add_and_upload_meme(&png_bytes(400, 200), "green", "PNG", vec!["green".into()])
        .await
        .unwrap();

    assert_eq!(meme.file_ext, "png");
    assert!(meme.media_url.starts_with("http://localhost:5000/media/"));
    assert_eq!(f.media.get_media(&meme.media_id).await.unwrap(), png_bytes(400, 200));

    let thumb = base64::engine::general_purpose::STANDARD
        .decode(meme.thumbnail.as_deref().unwrap())
        .unwrap();
    let img = image::load_from_memory(&thumb).unwrap();
    assert_eq!((img.width(), img.height()), (100, 50));
}

#[tokio::test]
async fn test_video_without_frame_source_has_no_thumbnail() {
    let f = fixture().await;
    let store = Arc::new(JsonRecordStore::new(Arc::new(LocalJsonFile::new(&f.db_path))));
    store.init_db().await.unwrap();
    let library = Library::new(store, f.media.clone())
        .with_thumbnails(Arc::new(ImageThumbnailer::default()));

    // Local media cannot extract frames; the add still succeeds
    let meme = library
        .add_and_upload_meme(b"not really a video", "clip", "mp4", Vec::new())
        .await
        .unwrap();
    assert_eq!(meme.media_type, MediaType::Video);
    assert_eq!(meme.thumbnail, None);
}

#[tokio::test]
async fn test_attach_media_sets_locators() {
    let f = fixture().await;
    let meme = f
        .library
        .add_meme_to_library(NewMeme::new("pending", "gif"), true)
        .await
        .unwrap();
    assert!(meme.media_url.is_empty());

    let updated = f.library.attach_media(meme.id, b"GIF89a").await.unwrap();
    assert!(updated.media_id.ends_with(".gif"));
    assert!(!updated.media_url.is_empty());

    let found = f.library.search("pending", SearchOptions::default()).await.unwrap();
    assert_eq!(found[0].media_url, updated.media_url);
}
