//! Admin routes through the full axum router.

mod common;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use base64::{engine::general_purpose::STANDARD, Engine};
use common::{repositories, FixedGeocoder, NoopIndexer};
use pf_api::{build_router, AppState};
use pf_auth_simple::{hash_password, SimpleAuthProvider};
use pf_core::traits::{InfluencerIndexer, MockInfluencerIndexer, Repositories};
use serde_json::{json, Value};
use tower::ServiceExt;

const USERNAME: &str = "curator";
const PASSWORD: &str = "correct horse";

async fn app_with(indexer: Arc<dyn InfluencerIndexer>) -> (Router, Repositories) {
    let repos = repositories().await;
    let geocoder = Arc::new(FixedGeocoder::default().with("Alexandria", 31.2, 29.92));
    let auth = SimpleAuthProvider::new(USERNAME, Some(hash_password(PASSWORD).unwrap()));
    let state = AppState::new(repos.clone(), geocoder, indexer, Arc::new(auth));
    (build_router(Arc::new(state)), repos)
}

async fn app() -> (Router, Repositories) {
    app_with(Arc::new(NoopIndexer)).await
}

fn basic(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

fn request(method: Method, uri: &str, auth: Option<String>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_admin_requires_credentials() {
    let (app, _) = app().await;

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/admin/moments", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));

    let response = app
        .oneshot(request(Method::GET, "/admin/moments", Some(basic(USERNAME, "wrong")), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_public_routes_stay_open() {
    let (app, _) = app().await;

    let health = app
        .clone()
        .oneshot(request(Method::GET, "/", None, None))
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);

    let response = app
        .oneshot(request(
            Method::POST,
            "/api",
            None,
            Some(json!({ "query": "{ influencers { name } }" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "data": { "influencers": [] } }));
}

#[tokio::test]
async fn test_create_list_and_delete_a_moment() {
    let (app, repos) = app().await;
    let auth = basic(USERNAME, PASSWORD);

    let created = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/admin/moments",
            Some(auth.clone()),
            Some(json!({
                "influencer": { "type": "person", "name": "Euclid" },
                "moment": { "date_begin": "0300-01-01", "date_end": "" },
                "locations": [{ "address": "Alexandria" }]
            })),
        ))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let created = json_body(created).await;
    assert_eq!(created["influencer"]["type"], "Person");
    assert_eq!(created["influencer"]["name"], "Euclid");
    assert_eq!(created["locations"][0]["latlng"], json!({ "lat": 31.2, "lng": 29.92 }));
    let moment_id = created["moment"]["id"].as_i64().unwrap();
    let person_id = created["influencer"]["id"].as_i64().unwrap();

    let listed = app
        .clone()
        .oneshot(request(
            Method::GET,
            &format!("/admin/moments?influencer_id={person_id}&influencer_type=Person"),
            Some(auth.clone()),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(listed.status(), StatusCode::OK);
    assert_eq!(json_body(listed).await.as_array().unwrap().len(), 1);

    let deleted = app
        .clone()
        .oneshot(request(
            Method::DELETE,
            &format!("/admin/moments/{moment_id}"),
            Some(auth.clone()),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
    assert!(repos.moments.all_moments().await.unwrap().is_empty());

    let again = app
        .oneshot(request(
            Method::DELETE,
            &format!("/admin/moments/{moment_id}"),
            Some(auth),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_address_is_unprocessable() {
    let (app, repos) = app().await;

    let response = app
        .oneshot(request(
            Method::POST,
            "/admin/moments",
            Some(basic(USERNAME, PASSWORD)),
            Some(json!({
                "influencer": { "type": "event", "name": "Fall of Atlantis" },
                "moment": { "date_begin": "0001-01-01" },
                "locations": [{ "address": "Atlantis" }]
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json_body(response).await["error"]
        .as_str()
        .unwrap()
        .contains("Atlantis"));
    assert!(repos.influencers.all_ordered_by_name().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_created_influencer_is_indexed_and_listed() {
    let mut indexer = MockInfluencerIndexer::new();
    indexer
        .expect_save()
        .withf(|influencer| influencer.name() == "Zhang Heng")
        .times(1)
        .returning(|_| Ok(()));
    let (app, _) = app_with(Arc::new(indexer)).await;
    let auth = basic(USERNAME, PASSWORD);

    let created = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/admin/influencers",
            Some(auth.clone()),
            Some(json!({ "type": "Person", "name": "Zhang Heng", "gender": "male" })),
        ))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);

    let listed = app
        .oneshot(request(Method::GET, "/admin/influencers", Some(auth), None))
        .await
        .unwrap();
    let listed = json_body(listed).await;
    assert_eq!(listed[0]["name"], "Zhang Heng");
    assert_eq!(listed[0]["earliest_date"], Value::Null);
}

#[tokio::test]
async fn test_cross_origin_delete_passes_preflight() {
    let (app, _) = app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/admin/moments/1")
                .header(header::ORIGIN, "https://timeline.example")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "DELETE")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let allowed = response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(allowed.contains("DELETE"), "allowed methods: {allowed}");
}
