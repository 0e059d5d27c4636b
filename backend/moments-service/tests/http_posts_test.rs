// HTTP tests for the /api/v1/posts routes
//
// The app is wired with the in-memory store and fake image store, so these
// exercise routing, identity extraction, multipart parsing and error bodies.

mod common;

use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use common::{FakeImageStore, InMemoryStore};
use moments_service::handlers::{self, AppState};
use moments_service::services::{LoveService, PostService};
use serde_json::Value;
use std::sync::Arc;

const BOUNDARY: &str = "moments-test-boundary";

fn app_state(store: &InMemoryStore) -> web::Data<AppState> {
    let repo = Arc::new(store.clone());
    web::Data::new(AppState {
        posts: Arc::new(PostService::new(repo.clone(), Arc::new(FakeImageStore::new()))),
        loves: Arc::new(LoveService::new(repo)),
        users: Arc::new(store.clone()),
        max_image_bytes: 1024 * 1024,
    })
}

/// text parts are (name, value); file parts are (name, file_name, content_type, bytes)
fn multipart_body(texts: &[(&str, &str)], files: &[(&str, &str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in texts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    for (name, file_name, content_type, bytes) in files {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                name, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

#[actix_web::test]
async fn test_missing_user_header_is_unauthorized() {
    let store = InMemoryStore::new();
    let app = test::init_service(
        App::new()
            .app_data(app_state(&store))
            .service(web::scope("/api/v1").configure(handlers::configure_routes)),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/v1/posts/1").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[actix_web::test]
async fn test_get_unknown_post_returns_invalid_id() {
    let store = InMemoryStore::new();
    store.add_user(1, "mom");
    let app = test::init_service(
        App::new()
            .app_data(app_state(&store))
            .service(web::scope("/api/v1").configure(handlers::configure_routes)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/posts/77")
        .insert_header(("x-user-id", "1"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "POST_INVALID_ID");
    assert_eq!(body["status"], 404);
}

#[actix_web::test]
async fn test_get_post_serializes_slots_with_nulls() {
    let store = InMemoryStore::new();
    let writer = store.add_user(1, "mom");
    let post_id = store.seed_post(writer.user_id, 5, "beach", &["https://cdn.test/a.jpg"]);
    let app = test::init_service(
        App::new()
            .app_data(app_state(&store))
            .service(web::scope("/api/v1").configure(handlers::configure_routes)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/posts/{}", post_id))
        .insert_header(("x-user-id", "1"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["postId"], post_id);
    assert_eq!(body["writer"], "mom");
    assert_eq!(body["content"], "beach");
    assert_eq!(
        body["imgs"],
        serde_json::json!(["https://cdn.test/a.jpg", null, null, null])
    );
    assert_eq!(body["countLove"], 0);
    assert_eq!(body["loved"], false);
}

#[actix_web::test]
async fn test_list_posts_with_cursor() {
    let store = InMemoryStore::new();
    let writer = store.add_user(1, "mom");
    let first = store.seed_post(writer.user_id, 5, "one", &[]);
    let second = store.seed_post(writer.user_id, 5, "two", &[]);
    let app = test::init_service(
        App::new()
            .app_data(app_state(&store))
            .service(web::scope("/api/v1").configure(handlers::configure_routes)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/posts?familyId=5")
        .insert_header(("x-user-id", "1"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|post| post["postId"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![second, first]);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/posts?familyId=5&postId={}", first))
        .insert_header(("x-user-id", "1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "POST_EMPTY_PAGE");
}

#[actix_web::test]
async fn test_create_post_from_multipart() {
    let store = InMemoryStore::new();
    store.add_user(1, "mom");
    let app = test::init_service(
        App::new()
            .app_data(app_state(&store))
            .service(web::scope("/api/v1").configure(handlers::configure_routes)),
    )
    .await;

    let body = multipart_body(
        &[("familyId", "5"), ("content", "first steps")],
        &[("imgs", "steps.jpg", "image/jpeg", &[0xFF, 0xD8, 0xFF][..])],
    );
    let req = test::TestRequest::post()
        .uri("/api/v1/posts")
        .insert_header(("x-user-id", "1"))
        .insert_header((header::CONTENT_TYPE, multipart_content_type()))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["content"], "first steps");
    assert_eq!(body["imgs"][0], FakeImageStore::url_for("steps.jpg"));
    assert_eq!(body["imgs"][1], Value::Null);
    assert_eq!(body["countLove"], 0);
    assert_eq!(store.post_count(), 1);
}

#[actix_web::test]
async fn test_create_post_requires_family_id() {
    let store = InMemoryStore::new();
    store.add_user(1, "mom");
    let app = test::init_service(
        App::new()
            .app_data(app_state(&store))
            .service(web::scope("/api/v1").configure(handlers::configure_routes)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/posts")
        .insert_header(("x-user-id", "1"))
        .insert_header((header::CONTENT_TYPE, multipart_content_type()))
        .set_payload(multipart_body(&[("content", "no family")], &[]))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.post_count(), 0);
}

#[actix_web::test]
async fn test_delete_by_other_user_is_forbidden() {
    let store = InMemoryStore::new();
    let writer = store.add_user(1, "mom");
    store.add_user(2, "dad");
    let post_id = store.seed_post(writer.user_id, 5, "mine", &[]);
    let app = test::init_service(
        App::new()
            .app_data(app_state(&store))
            .service(web::scope("/api/v1").configure(handlers::configure_routes)),
    )
    .await;

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/posts/{}", post_id))
        .insert_header(("x-user-id", "2"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/posts/{}", post_id))
        .insert_header(("x-user-id", "1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(!store.post(post_id).unwrap().is_active());
}

#[actix_web::test]
async fn test_love_then_read_count() {
    let store = InMemoryStore::new();
    let writer = store.add_user(1, "mom");
    store.add_user(2, "dad");
    let post_id = store.seed_post(writer.user_id, 5, "cake", &[]);
    let app = test::init_service(
        App::new()
            .app_data(app_state(&store))
            .service(web::scope("/api/v1").configure(handlers::configure_routes)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/posts/{}/loves", post_id))
        .insert_header(("x-user-id", "2"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/posts/{}/loves", post_id))
        .insert_header(("x-user-id", "2"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/posts/{}", post_id))
        .insert_header(("x-user-id", "2"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["countLove"], 1);
    assert_eq!(body["loved"], true);
}

#[actix_web::test]
async fn test_create_post_with_text_file_is_unprocessable() {
    let store = InMemoryStore::new();
    store.add_user(1, "mom");
    let app = test::init_service(
        App::new()
            .app_data(app_state(&store))
            .service(web::scope("/api/v1").configure(handlers::configure_routes)),
    )
    .await;

    let body = multipart_body(
        &[("familyId", "5"), ("content", "notes")],
        &[("imgs", "notes.txt", "text/plain", &b"not a picture"[..])],
    );
    let req = test::TestRequest::post()
        .uri("/api/v1/posts")
        .insert_header(("x-user-id", "1"))
        .insert_header((header::CONTENT_TYPE, multipart_content_type()))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "INVALID_IMAGE");
    assert_eq!(store.post_count(), 0);
}
