//! Integration tests for the Code Camp API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server, backed by the in-memory repository seeded with
//! the default account and sample camp. A repository that fails every call
//! covers the store-fault paths.

#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::missing_panics_doc)]

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use axum::Router;
use codecamp_api::{AppState, build_router};
use codecamp_core::config::SeedSettings;
use codecamp_core::identity::hash_password;
use codecamp_core::{ConfigSource, ConfigStore, TokenService};
use codecamp_db::{CampRepository, Change, ChangeSet, Committed, DbError, MemoryRepository, seed};
use codecamp_types::{Camp, CampId, CampUser, Speaker, SpeakerId, Talk, TalkId, UserDetails, UserId};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

const BASE: &str = "http://localhost:8080";

struct TestApp {
    router: Router,
    repo: Arc<MemoryRepository>,
    dir: TempDir,
}

fn write_settings(dir: &Path, public_url: &str) {
    std::fs::write(
        dir.join("appsettings.toml"),
        format!(
            "[server]\npublic_url = \"{public_url}\"\n\n[tokens]\nkey = \"integration-test-signing-key-0123456789\"\n"
        ),
    )
    .unwrap();
}

fn open_store(dir: &TempDir) -> Arc<ConfigStore> {
    write_settings(dir.path(), BASE);
    Arc::new(ConfigStore::open(ConfigSource::new(dir.path())).unwrap())
}

async fn make_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);
    let repo = Arc::new(MemoryRepository::new());
    seed(repo.as_ref(), &store.current().await.seed).await.unwrap();

    let state = Arc::new(AppState::new(
        Arc::clone(&repo) as Arc<dyn CampRepository>,
        store,
    ));
    TestApp {
        router: build_router(state),
        repo,
        dir,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, headers, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, body: &Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn versioned(uri: &str, version: &str) -> Request<Body> {
    Request::get(uri)
        .header("ver", version)
        .body(Body::empty())
        .unwrap()
}

async fn token_for(router: &Router, user_name: &str, password: &str) -> String {
    let (status, _, body) = send(
        router,
        json_request(
            "POST",
            "/api/auth/token",
            &json!({ "userName": user_name, "password": password }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "token request failed: {body}");
    body["token"].as_str().unwrap().to_owned()
}

async fn seed_token(router: &Router) -> String {
    let seed = SeedSettings::default();
    token_for(router, &seed.user_name, &seed.password).await
}

async fn add_user(repo: &MemoryRepository, user_name: &str, password: &str) {
    repo.save_all(ChangeSet::new().with(Change::AddUser(Box::new(UserDetails {
        user_name: user_name.to_owned(),
        password_hash: hash_password(password).unwrap(),
        ..UserDetails::default()
    }))))
    .await
    .unwrap();
}

async fn sample_speaker_id(router: &Router) -> i64 {
    let (_, _, body) = send(router, versioned("/api/camps/ATL2016/speakers", "1.0")).await;
    body[0]["id"].as_i64().unwrap()
}

fn relative(location: &str) -> &str {
    location.strip_prefix(BASE).unwrap()
}

// =============================================================================
// Camps
// =============================================================================

#[tokio::test]
async fn list_camps_returns_seeded_sample() {
    let app = make_app().await;
    let (status, _, body) = send(&app.router, get("/api/camps")).await;

    assert_eq!(status, StatusCode::OK);
    let camps = body.as_array().unwrap();
    assert_eq!(camps.len(), 1);
    assert_eq!(camps[0]["moniker"], "ATL2016");
    assert_eq!(camps[0]["url"], "http://localhost:8080/api/camps/ATL2016");
    assert_eq!(camps[0]["endDate"], camps[0]["startDate"]);
    assert!(camps[0].get("speakers").is_none());
}

#[tokio::test]
async fn get_camp_includes_speakers_on_request() {
    let app = make_app().await;
    let (status, _, body) = send(
        &app.router,
        get("/api/camps/ATL2016?includeSpeakers=true"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["speakers"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_camp_is_404_naming_moniker() {
    let app = make_app().await;
    let (status, _, body) = send(&app.router, get("/api/camps/NOPE2099")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("NOPE2099"));
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn created_camp_location_resolves() {
    let app = make_app().await;
    let (status, headers, body) = send(
        &app.router,
        json_request(
            "POST",
            "/api/camps",
            &json!({ "moniker": "NEW2025", "name": "New Camp", "length": 2 }),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["moniker"], "NEW2025");
    let location = headers[header::LOCATION].to_str().unwrap();
    assert_eq!(location, "http://localhost:8080/api/camps/NEW2025");

    let (status, _, fetched) = send(&app.router, get(relative(location))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "New Camp");
}

#[tokio::test]
async fn create_camp_without_moniker_is_400() {
    let app = make_app().await;
    let (status, _, _) = send(
        &app.router,
        json_request("POST", "/api/camps", &json!({ "name": "No slug" }), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_moniker_is_400() {
    let app = make_app().await;
    let (status, _, _) = send(
        &app.router,
        json_request(
            "POST",
            "/api/camps",
            &json!({ "moniker": "ATL2016", "name": "Again" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn camp_update_keeps_zero_valued_fields() {
    let app = make_app().await;
    let (status, _, _) = send(
        &app.router,
        json_request(
            "POST",
            "/api/camps",
            &json!({ "moniker": "DEVUP", "name": "DevUp", "length": 2 }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _, body) = send(
        &app.router,
        json_request(
            "PUT",
            "/api/camps/DEVUP",
            &json!({ "name": "", "length": 3 }),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "DevUp");
    assert_eq!(body["length"], 3);

    let (_, _, stored) = send(&app.router, get("/api/camps/DEVUP")).await;
    assert_eq!(stored["name"], "DevUp");
    assert_eq!(stored["length"], 3);
}

#[tokio::test]
async fn update_unknown_camp_is_404() {
    let app = make_app().await;
    let (status, _, _) = send(
        &app.router,
        json_request("PUT", "/api/camps/NOPE", &json!({ "name": "x" }), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_camp_twice_is_200_then_404() {
    let app = make_app().await;
    let delete = || {
        Request::delete("/api/camps/ATL2016")
            .body(Body::empty())
            .unwrap()
    };

    let (status, _, _) = send(&app.router, delete()).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = send(&app.router, delete()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = send(
        &app.router,
        Request::delete("/api/camps/NEVER").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Speakers
// =============================================================================

#[tokio::test]
async fn speaker_listing_follows_version_header() {
    let app = make_app().await;
    let uri = "/api/camps/ATL2016/speakers";

    let (status, headers, v10) = send(&app.router, versioned(uri, "1.0")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v10.as_array().unwrap().len(), 1);
    assert_eq!(headers["api-supported-versions"], "1.0, 1.1, 2.0");

    let (_, _, v11) = send(&app.router, versioned(uri, "1.1")).await;
    assert_eq!(
        v11["count"].as_u64().unwrap(),
        v11["results"].as_array().unwrap().len() as u64
    );
    assert!(v11.get("currentTime").is_none());

    let (_, _, default) = send(&app.router, get(uri)).await;
    assert_eq!(default["count"], 1);

    let (_, _, v20) = send(&app.router, versioned(uri, "2.0")).await;
    assert!(v20.get("currentTime").is_some());
    assert_eq!(
        v20["results"][0]["badgeName"],
        "Shawn Wildermuth (@shawnwildermuth)"
    );

    let (status, _, _) = send(&app.router, versioned(uri, "9.9")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn speaker_include_talks() {
    let app = make_app().await;
    let id = sample_speaker_id(&app.router).await;

    let (status, _, body) = send(
        &app.router,
        get(&format!("/api/camps/ATL2016/speakers/{id}?includeTalks=true")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["talks"].as_array().unwrap().len(), 2);

    let (_, _, lazy) = send(&app.router, get(&format!("/api/camps/ATL2016/speakers/{id}"))).await;
    assert!(lazy.get("talks").is_none());
}

#[tokio::test]
async fn speaker_in_other_camp_is_400() {
    let app = make_app().await;
    let id = sample_speaker_id(&app.router).await;
    send(
        &app.router,
        json_request(
            "POST",
            "/api/camps",
            &json!({ "moniker": "OTHER", "name": "Other" }),
            None,
        ),
    )
    .await;

    let (status, _, _) = send(&app.router, get(&format!("/api/camps/OTHER/speakers/{id}"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = send(&app.router, get("/api/camps/ATL2016/speakers/99999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn speaker_create_requires_authentication() {
    let app = make_app().await;
    let body = json!({ "name": "Grace Hopper", "twitterName": "grace" });

    let (status, _, _) = send(
        &app.router,
        json_request("POST", "/api/camps/ATL2016/speakers", &body, None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(
        &app.router,
        json_request("POST", "/api/camps/ATL2016/speakers", &body, Some("not-a-token")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = seed_token(&app.router).await;
    let (status, headers, created) = send(
        &app.router,
        json_request("POST", "/api/camps/ATL2016/speakers", &body, Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Grace Hopper");

    let location = headers[header::LOCATION].to_str().unwrap();
    let (status, _, _) = send(&app.router, get(relative(location))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn speaker_create_for_unknown_camp_is_400() {
    let app = make_app().await;
    let token = seed_token(&app.router).await;
    let (status, _, body) = send(
        &app.router,
        json_request(
            "POST",
            "/api/camps/NOPE/speakers",
            &json!({ "name": "Nobody" }),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Could not find Camp");
}

#[tokio::test]
async fn non_owner_cannot_change_speaker() {
    let app = make_app().await;
    add_user(&app.repo, "intruder", "intruder-pass").await;
    let token = token_for(&app.router, "intruder", "intruder-pass").await;
    let id = sample_speaker_id(&app.router).await;
    let uri = format!("/api/camps/ATL2016/speakers/{id}");

    let (status, _, _) = send(
        &app.router,
        json_request("PUT", &uri, &json!({ "name": "Hijacked" }), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let delete = Request::delete(uri.as_str())
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&app.router, delete).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, _, unchanged) = send(&app.router, get(&uri)).await;
    assert_eq!(unchanged["name"], "Shawn Wildermuth");
}

#[tokio::test]
async fn owner_updates_speaker_with_partial_merge() {
    let app = make_app().await;
    let token = seed_token(&app.router).await;
    let id = sample_speaker_id(&app.router).await;

    let (status, _, body) = send(
        &app.router,
        json_request(
            "PUT",
            &format!("/api/camps/ATL2016/speakers/{id}"),
            &json!({ "name": "", "companyName": "Acme" }),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Shawn Wildermuth");
    assert_eq!(body["companyName"], "Acme");
}

// =============================================================================
// Talks
// =============================================================================

#[tokio::test]
async fn talk_listing_follows_version_header() {
    let app = make_app().await;
    let id = sample_speaker_id(&app.router).await;
    let uri = format!("/api/camps/ATL2016/speakers/{id}/talks");

    let (status, _, v10) = send(&app.router, versioned(&uri, "1.0")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v10.as_array().unwrap().len(), 2);
    assert!(v10[0]["abstract"].is_string());

    let (_, _, v20) = send(&app.router, versioned(&uri, "2.0")).await;
    assert_eq!(v20["count"], 2);
}

#[tokio::test]
async fn v2_talk_create_checks_camp_window() {
    let app = make_app().await;
    let token = seed_token(&app.router).await;
    let id = sample_speaker_id(&app.router).await;
    let uri = format!("/api/camps/ATL2016/speakers/{id}/talks");

    let create = |version: &str, starting: &str| {
        Request::post(uri.as_str())
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header("ver", version)
            .body(Body::from(
                json!({
                    "title": "Async Rust",
                    "abstract": "Futures and executors",
                    "startingTime": starting,
                })
                .to_string(),
            ))
            .unwrap()
    };

    let (status, _, _) = send(&app.router, create("2.0", "2016-10-20T10:00:00")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = send(&app.router, create("1.1", "2016-10-20T10:00:00")).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, headers, body) = send(&app.router, create("2.0", "2016-10-18T10:00:00")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["title"], "Async Rust");
    let location = headers[header::LOCATION].to_str().unwrap();
    let (status, _, _) = send(&app.router, get(relative(location))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn talk_create_requires_title_and_abstract() {
    let app = make_app().await;
    let token = seed_token(&app.router).await;
    let id = sample_speaker_id(&app.router).await;

    let (status, _, _) = send(
        &app.router,
        json_request(
            "POST",
            &format!("/api/camps/ATL2016/speakers/{id}/talks"),
            &json!({ "title": "No abstract" }),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_owner_cannot_delete_talk() {
    let app = make_app().await;
    add_user(&app.repo, "intruder", "intruder-pass").await;
    let token = token_for(&app.router, "intruder", "intruder-pass").await;
    let id = sample_speaker_id(&app.router).await;

    let (_, _, talks) = send(
        &app.router,
        versioned(&format!("/api/camps/ATL2016/speakers/{id}/talks"), "1.0"),
    )
    .await;
    let talk_id = talks[0]["id"].as_i64().unwrap();

    let delete = Request::delete(format!(
        "/api/camps/ATL2016/speakers/{id}/talks/{talk_id}"
    ))
    .header(header::AUTHORIZATION, format!("Bearer {token}"))
    .body(Body::empty())
    .unwrap();
    let (status, _, _) = send(&app.router, delete).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// =============================================================================
// Auth
// =============================================================================

#[tokio::test]
async fn login_sets_cookie_that_authenticates() {
    let app = make_app().await;
    let seed = SeedSettings::default();

    let (status, headers, body) = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/login",
            &json!({ "userName": seed.user_name, "password": seed.password }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);

    let cookie = headers[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.contains("HttpOnly"));
    let pair = cookie.split(';').next().unwrap().to_owned();

    let request = Request::post("/api/camps/ATL2016/speakers")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, pair)
        .body(Body::from(json!({ "name": "Cookie Monster" }).to_string()))
        .unwrap();
    let (status, _, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn login_failures_share_one_message() {
    let app = make_app().await;
    let seed = SeedSettings::default();

    for credentials in [
        json!({ "userName": seed.user_name, "password": "wrong" }),
        json!({ "userName": "ghost", "password": "whatever" }),
        json!({ "userName": "", "password": "" }),
    ] {
        let (status, _, body) = send(
            &app.router,
            json_request("POST", "/api/auth/login", &credentials, None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Failed to login");
    }
}

#[tokio::test]
async fn token_endpoint_rejects_bad_credentials() {
    let app = make_app().await;
    let (status, _, body) = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/token",
            &json!({ "userName": "ghost", "password": "x" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Failed to generate token");
}

// =============================================================================
// Malformed paths and inputs
// =============================================================================

#[tokio::test]
async fn unparseable_ids_get_the_error_body() {
    let app = make_app().await;

    for uri in [
        "/api/camps/ATL2016/speakers/abc",
        "/api/camps/ATL2016/speakers/99999999999999999999",
        "/api/camps/ATL2016/speakers/1/talks/x",
    ] {
        let (status, headers, body) = send(&app.router, get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(headers[header::CONTENT_TYPE], "application/json", "{uri}");
        assert_eq!(body["status"], 400, "{uri}");
        assert!(body["error"].is_string(), "{uri}");
    }
}

#[tokio::test]
async fn unparseable_query_flag_gets_the_error_body() {
    let app = make_app().await;
    let (status, _, body) = send(
        &app.router,
        get("/api/camps/ATL2016?includeSpeakers=maybe"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn camp_start_date_accepts_date_only_and_utc() {
    let app = make_app().await;

    for (moniker, start) in [("DATEONLY", "2024-10-14"), ("UTCZ", "2024-10-14T00:00:00Z")] {
        let (status, _, body) = send(
            &app.router,
            json_request(
                "POST",
                "/api/camps",
                &json!({ "moniker": moniker, "name": "Dated", "startDate": start }),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{start}");
        assert_eq!(body["startDate"], "2024-10-14T00:00:00", "{start}");
    }
}

// =============================================================================
// Store faults
// =============================================================================

/// Repository whose every call fails, as an unreachable database would.
struct FailingRepository;

fn store_down() -> DbError {
    DbError::Config(String::from("store unavailable"))
}

#[async_trait]
impl CampRepository for FailingRepository {
    async fn all_camps(&self) -> Result<Vec<Camp>, DbError> {
        Err(store_down())
    }

    async fn camp(&self, _id: CampId) -> Result<Option<Camp>, DbError> {
        Err(store_down())
    }

    async fn camp_by_moniker(
        &self,
        _moniker: &str,
        _include_speakers: bool,
    ) -> Result<Option<Camp>, DbError> {
        Err(store_down())
    }

    async fn speakers_by_moniker(
        &self,
        _moniker: &str,
        _include_talks: bool,
    ) -> Result<Vec<Speaker>, DbError> {
        Err(store_down())
    }

    async fn speaker(
        &self,
        _id: SpeakerId,
        _include_talks: bool,
    ) -> Result<Option<Speaker>, DbError> {
        Err(store_down())
    }

    async fn talks(&self, _speaker_id: SpeakerId) -> Result<Vec<Talk>, DbError> {
        Err(store_down())
    }

    async fn talk(&self, _id: TalkId) -> Result<Option<Talk>, DbError> {
        Err(store_down())
    }

    async fn user(&self, _user_name: &str) -> Result<Option<CampUser>, DbError> {
        Err(store_down())
    }

    async fn save_all(&self, _changes: ChangeSet) -> Result<Committed, DbError> {
        Err(store_down())
    }
}

fn assert_downgraded(status: StatusCode, body: &Value, message: &str) {
    assert_eq!(status, StatusCode::BAD_REQUEST, "{message}");
    assert_eq!(body["error"], message);
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn store_faults_are_reported_as_400() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);
    let token = TokenService::new(&store.current().await.tokens)
        .issue(
            &CampUser {
                id: UserId(1),
                details: UserDetails {
                    user_name: String::from("s.gwozdz"),
                    ..UserDetails::default()
                },
            },
            chrono::Utc::now(),
        )
        .unwrap()
        .token;
    let router = build_router(Arc::new(AppState::new(Arc::new(FailingRepository), store)));

    let (status, _, body) = send(&router, get("/api/camps")).await;
    assert_downgraded(status, &body, "Could not load camps");

    let (status, _, body) = send(&router, get("/api/camps/ATL2016")).await;
    assert_downgraded(status, &body, "Could not load camp");

    let (status, _, body) = send(
        &router,
        json_request(
            "POST",
            "/api/camps",
            &json!({ "moniker": "DOWN", "name": "Unreachable" }),
            None,
        ),
    )
    .await;
    assert_downgraded(status, &body, "Could not save camp");

    let (status, _, body) = send(
        &router,
        json_request(
            "PUT",
            "/api/camps/ATL2016/speakers/1",
            &json!({ "name": "Renamed" }),
            Some(&token),
        ),
    )
    .await;
    assert_downgraded(status, &body, "Could not load speaker");

    let (status, _, body) = send(
        &router,
        json_request(
            "POST",
            "/api/auth/login",
            &json!({ "userName": "s.gwozdz", "password": "PassW0RD!" }),
            None,
        ),
    )
    .await;
    assert_downgraded(status, &body, "Failed to login");
}

// =============================================================================
// Operations and middleware
// =============================================================================

#[tokio::test]
async fn reload_config_swaps_settings_and_keeps_them_on_failure() {
    let app = make_app().await;
    let reload = || {
        Request::options("/api/operations/reloadConfig")
            .body(Body::empty())
            .unwrap()
    };

    write_settings(app.dir.path(), "https://camps.example.org");
    let (status, _, body) = send(&app.router, reload()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Configuration reloaded");

    let (_, _, camp) = send(&app.router, get("/api/camps/ATL2016")).await;
    assert_eq!(camp["url"], "https://camps.example.org/api/camps/ATL2016");

    std::fs::write(app.dir.path().join("appsettings.toml"), "[server\nbroken").unwrap();
    let (status, _, _) = send(&app.router, reload()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, _, camp) = send(&app.router, get("/api/camps/ATL2016")).await;
    assert_eq!(camp["url"], "https://camps.example.org/api/camps/ATL2016");
}

#[tokio::test]
async fn cross_origin_options_still_reaches_reload() {
    let app = make_app().await;
    write_settings(app.dir.path(), "https://mirror.example.net");

    let request = Request::options("/api/operations/reloadConfig")
        .header(header::ORIGIN, "http://elsewhere.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Configuration reloaded");

    let (_, _, camp) = send(&app.router, get("/api/camps/ATL2016")).await;
    assert_eq!(camp["url"], "https://mirror.example.net/api/camps/ATL2016");
}

#[tokio::test]
async fn preflight_on_resource_routes_allows_get_only() {
    let app = make_app().await;
    let request = Request::options("/api/camps")
        .header(header::ORIGIN, "http://elsewhere.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "GET");
}

#[tokio::test]
async fn cross_origin_get_is_allowed() {
    let app = make_app().await;
    let request = Request::get("/api/camps")
        .header(header::ORIGIN, "http://elsewhere.example")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}
