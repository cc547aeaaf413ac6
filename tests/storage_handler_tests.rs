use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    extract::Request,
    http::{StatusCode, header},
    middleware::Next,
    response::Response,
};
use export_gateway::{
    AppConfig, AppState, compose,
    auth::Identity,
    handlers,
    middleware::{Interceptor, factory},
    routes::{Module, Route},
    storage::MockStorageService,
};
use std::sync::Arc;
use tower::util::ServiceExt;

const DATASET: &str = "enwiki";
const BAD_DATASET: &str = "e";
const NAMESPACE: &str = "0";
const BAD_NAMESPACE: &str = "10";
const DATA: &str = r#"{"name":"Earth","identifier":9228,"version":12,"dateModified":"0001-01-01T00:00:00Z","url":"http://en.wikipedia.org/wiki/Earth"}"#;
const GROUP: &str = "group_1";

// --- Test Fixtures ---

/// Stands in for the JWT + RBAC stack: attaches a fixed identity.
struct FixedIdentity(Identity);

#[async_trait]
impl Interceptor for FixedIdentity {
    async fn intercept(&self, mut request: Request, next: Next) -> Response {
        request.extensions_mut().insert(self.0.clone());
        next.run(request).await
    }
}

fn app(store: Arc<MockStorageService>, groups: Option<&[&str]>) -> Router {
    let mut module = Module::new("/exports");
    if let Some(groups) = groups {
        let identity = Identity::new("user", groups.iter().copied());
        module = module.middleware(factory(move || FixedIdentity(identity.clone())));
    }
    let module = module.route(Route::get("/:namespace/:dataset", handlers::export_detail));

    let state = AppState {
        storage: store,
        config: AppConfig::default(),
    };

    compose(Router::new(), &[module])
        .expect("module table is valid")
        .router
        .with_state(state)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|value| value.to_str().unwrap().to_string());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

fn detail_uri(namespace: &str, dataset: &str) -> String {
    format!("/exports/{namespace}/{dataset}")
}

// --- Tests ---

#[tokio::test]
async fn test_detail_success_for_unlimited_group() {
    let key = format!("export/{DATASET}/{DATASET}_{NAMESPACE}.json");
    let store = Arc::new(MockStorageService::new().with_object(key.clone(), DATA));

    let (status, content_type, body) =
        get(app(store.clone(), Some(&["unlimited"])), &detail_uri(NAMESPACE, DATASET)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, DATA);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(store.requested_keys(), vec![key]);
}

#[tokio::test]
async fn test_detail_success_for_custom_group() {
    let key = format!("export/{DATASET}/{DATASET}_{GROUP}_{NAMESPACE}.json");
    assert_eq!(key, "export/enwiki/enwiki_group_1_0.json");
    let store = Arc::new(MockStorageService::new().with_object(key.clone(), DATA));

    let (status, _, body) =
        get(app(store.clone(), Some(&[GROUP])), &detail_uri(NAMESPACE, DATASET)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, DATA);
    assert_eq!(store.requested_keys(), vec![key]);
}

#[tokio::test]
async fn test_detail_unlimited_takes_precedence_over_custom_group() {
    let store = Arc::new(MockStorageService::new());

    let _ = get(
        app(store.clone(), Some(&[GROUP, "unlimited"])),
        &detail_uri(NAMESPACE, DATASET),
    )
    .await;

    assert_eq!(store.requested_keys(), vec!["export/enwiki/enwiki_0.json".to_string()]);
}

#[tokio::test]
async fn test_detail_namespace_error() {
    let store = Arc::new(MockStorageService::new());

    let (status, _, body) =
        get(app(store.clone(), Some(&["group_2"])), &detail_uri(BAD_NAMESPACE, DATASET)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains(BAD_NAMESPACE));
    assert!(store.requested_keys().is_empty());
}

#[tokio::test]
async fn test_detail_dataset_error() {
    let store = Arc::new(MockStorageService::new());

    let (status, _, body) =
        get(app(store.clone(), Some(&["unlimited"])), &detail_uri(NAMESPACE, BAD_DATASET)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains(&format!("'{BAD_DATASET}'")));
    assert!(store.requested_keys().is_empty());
}

#[tokio::test]
async fn test_detail_missing_key_is_not_found() {
    let store = Arc::new(MockStorageService::new());

    let (status, _, body) =
        get(app(store, Some(&["unlimited"])), &detail_uri(NAMESPACE, DATASET)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("key does not exist"));
    assert!(body.contains("export/enwiki/enwiki_0.json"));
}

#[tokio::test]
async fn test_detail_backend_failure_is_not_found() {
    let store = Arc::new(MockStorageService::new_failing());

    let (status, _, body) =
        get(app(store, Some(&[GROUP])), &detail_uri(NAMESPACE, DATASET)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Mock Storage Error: Simulation requested"));
}

#[tokio::test]
async fn test_detail_rejects_caller_outside_export_groups() {
    let key = format!("export/{DATASET}/{DATASET}_{NAMESPACE}.json");
    let store = Arc::new(MockStorageService::new().with_object(key, DATA));

    let (status, _, body) =
        get(app(store.clone(), Some(&["group_2"])), &detail_uri(NAMESPACE, DATASET)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("user"));
    assert!(store.requested_keys().is_empty());
}

#[tokio::test]
async fn test_detail_without_identity_is_internal_error() {
    let store = Arc::new(MockStorageService::new());

    let (status, _, _) = get(app(store.clone(), None), &detail_uri(NAMESPACE, DATASET)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(store.requested_keys().is_empty());
}

#[tokio::test]
async fn test_detail_streams_binary_content_unchanged() {
    let key = "export/dewiktionary/dewiktionary_14.json";
    let payload: Vec<u8> = (0..=255u8).cycle().take(64 * 1024).collect();
    let store = Arc::new(MockStorageService::new().with_object(key, payload.clone()));

    let response = app(store, Some(&["unlimited"]))
        .oneshot(
            Request::builder()
                .uri(detail_uri("14", "dewiktionary"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_LENGTH).unwrap(),
        &payload.len().to_string()
    );
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(body.as_ref(), payload.as_slice());
}
