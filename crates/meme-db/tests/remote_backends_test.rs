//! Remote record and media backends against a mock storage server.

use std::sync::Arc;

use meme_db::{
    DocumentStorage, Error, JsonRecordStore, MediaStorage, NewMeme, RecordStore,
    RemoteJsonDocument, RemoteMediaStorage,
};
use wiremock::matchers::{body_bytes, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_remote_upload_parses_envelope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(query_param("fileExt", "png"))
        .and(body_bytes(b"png-bytes".to_vec()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "payload": { "mediaID": "42", "mediaURL": "http://cdn.test/42.png" }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let storage = RemoteMediaStorage::new(mock_server.uri());
    let media = storage.upload(b"png-bytes", ".PNG").await.unwrap();
    assert_eq!(media.media_id, "42");
    assert_eq!(media.media_url, "http://cdn.test/42.png");
}

#[tokio::test]
async fn test_remote_upload_failure_is_storage_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let storage = RemoteMediaStorage::new(mock_server.uri());
    let err = storage.upload(b"x", "mp4").await.unwrap_err();
    assert!(err.is_storage(), "unexpected error: {err}");
}

#[tokio::test]
async fn test_remote_upload_rejected_envelope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": false,
            "error": true,
            "error_message": "quota exceeded",
            "statusCode": 200
        })))
        .mount(&mock_server)
        .await;

    let storage = RemoteMediaStorage::new(mock_server.uri());
    let err = storage.upload(b"x", "mp4").await.unwrap_err();
    assert!(err.to_string().contains("quota exceeded"));
}

#[tokio::test]
async fn test_remote_media_and_thumbnail_fetch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/media/7"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"media".to_vec()))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/thumbnail/7"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"frame".to_vec()))
        .mount(&mock_server)
        .await;

    let storage = RemoteMediaStorage::new(format!("{}/", mock_server.uri()));
    assert_eq!(storage.get_media("7").await.unwrap(), b"media");
    assert_eq!(storage.video_to_thumbnail("7").await.unwrap(), b"frame");

    let err = storage.get_media("8").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_remote_document_missing_then_written() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/db.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/db.json"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let doc = Arc::new(RemoteJsonDocument::new(
        format!("{}/db.json", mock_server.uri()),
        Some("secret".to_string()),
    ));
    assert!(doc.read().await.unwrap().is_none());

    let store = JsonRecordStore::new(doc);
    store.load_db().await.unwrap();
    assert_eq!(store.count().await.unwrap(), 0);

    store
        .add_item(NewMeme::new("doge meme", "jpg").with_tags(["dog"]), None)
        .await
        .unwrap();
    store.write_db().await.unwrap();
}

#[tokio::test]
async fn test_remote_document_loads_records() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/db.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "nextID": 2,
            "items": {
                "0": {"id": 0, "name": "doge meme", "mediaType": "image", "fileExt": "jpg",
                      "tags": ["dog", "funny"], "mediaID": "a", "mediaURL": "http://x/a", "thumbnail": ""},
                "1": {"id": 1, "name": "cat jam", "mediaType": "video", "fileExt": "mp4",
                      "tags": ["cat", "music"], "mediaID": "b", "mediaURL": "http://x/b", "thumbnail": ""}
            }
        })))
        .mount(&mock_server)
        .await;

    let store = JsonRecordStore::new(Arc::new(RemoteJsonDocument::new(
        format!("{}/db.json", mock_server.uri()),
        None,
    )));
    store.load_db().await.unwrap();

    let all = store.all_items().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].name, "cat jam");
    assert!(matches!(
        store.get_item(9).await.unwrap_err(),
        Error::MemeNotFound(9)
    ));
}

#[tokio::test]
async fn test_remote_document_write_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let doc = RemoteJsonDocument::new(format!("{}/db.json", mock_server.uri()), None);
    let err = doc.write(b"{}").await.unwrap_err();
    assert!(err.is_storage());
}
