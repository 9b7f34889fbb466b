use std::{collections::HashSet, sync::Arc};

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode, Uri},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use shared::{
    domain::{ChildId, ChildKind, ScenarioId},
    error::{ApiException, ErrorCode},
    protocol::{ChildRecord, ChildWrite},
};
use tokio::{net::TcpListener, sync::Mutex};

use crate::{AdminBackend, DraftEditor, EditorError, HttpAdminBackend, LoadOutcome};

#[derive(Debug, Clone)]
struct SeenRequest {
    method: &'static str,
    path: String,
    body: Option<Value>,
    authorization: Option<String>,
}

#[derive(Default)]
struct MockInner {
    records: Vec<(String, ChildRecord)>,
    requests: Vec<SeenRequest>,
    next_id: i64,
    failing_ids: HashSet<i64>,
}

#[derive(Clone, Default)]
struct MockState {
    inner: Arc<Mutex<MockInner>>,
}

type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

fn not_found(what: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "detail": format!("{what} not found") })),
    )
}

fn collection_of(uri: &Uri) -> String {
    uri.path().split('/').nth(2).unwrap_or_default().to_string()
}

impl MockState {
    async fn seed(&self, collection: &str, id: i64, text: &str, sort_order: i64) {
        let mut inner = self.inner.lock().await;
        inner.records.push((
            collection.to_string(),
            ChildRecord {
                id: ChildId(id),
                text: text.to_string(),
                sort_order,
                scenario_id: ScenarioId(1),
                is_active: (collection == "questions").then_some(true),
                created_at: None,
                updated_at: None,
            },
        ));
        inner.next_id = inner.next_id.max(id);
    }

    async fn note(
        &self,
        method: &'static str,
        uri: &Uri,
        headers: &HeaderMap,
        body: Option<Value>,
    ) {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        self.inner.lock().await.requests.push(SeenRequest {
            method,
            path: uri.path().to_string(),
            body,
            authorization,
        });
    }

    async fn requests(&self) -> Vec<SeenRequest> {
        self.inner.lock().await.requests.clone()
    }
}

async fn list_scenarios(State(state): State<MockState>, uri: Uri, headers: HeaderMap) -> Json<Value> {
    state.note("GET", &uri, &headers, None).await;
    Json(json!([
        { "id": 2, "name": "Follow-up", "greeting_text": "Hello again", "conversation_mode": "B" },
        { "id": 1, "name": "Survey", "greeting_text": "Hello" }
    ]))
}

async fn get_scenario(
    State(state): State<MockState>,
    Path(scenario_id): Path<i64>,
    uri: Uri,
    headers: HeaderMap,
) -> ApiResult {
    state.note("GET", &uri, &headers, None).await;
    if scenario_id != 1 {
        return Err(not_found("Scenario"));
    }
    Ok(Json(json!({ "id": 1, "name": "Survey", "ending_guidances": [] })))
}

async fn list_children(
    State(state): State<MockState>,
    Path((scenario_id, collection)): Path<(i64, String)>,
    uri: Uri,
    headers: HeaderMap,
) -> ApiResult {
    state.note("GET", &uri, &headers, None).await;
    if scenario_id == 404 {
        return Err(not_found("Scenario"));
    }
    let inner = state.inner.lock().await;
    let mut records: Vec<&ChildRecord> = inner
        .records
        .iter()
        .filter(|(kind, record)| *kind == collection && record.scenario_id.0 == scenario_id)
        .map(|(_, record)| record)
        .collect();
    records.sort_by_key(|record| record.sort_order);
    Ok(Json(json!(records)))
}

async fn create_child(
    State(state): State<MockState>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult {
    state.note("POST", &uri, &headers, Some(body.clone())).await;
    let write: ChildWrite = serde_json::from_value(body)
        .map_err(|err| (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "detail": err.to_string() }))))?;
    let mut inner = state.inner.lock().await;
    inner.next_id += 1;
    let record = ChildRecord {
        id: ChildId(inner.next_id),
        text: write.text,
        sort_order: write.sort_order,
        scenario_id: write.scenario_id,
        is_active: write.is_active,
        created_at: Some("2024-06-01T12:00:00".parse().expect("timestamp")),
        updated_at: None,
    };
    inner.records.push((collection_of(&uri), record.clone()));
    Ok(Json(json!(record)))
}

async fn update_child(
    State(state): State<MockState>,
    Path(id): Path<i64>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult {
    state.note("PUT", &uri, &headers, Some(body.clone())).await;
    let collection = collection_of(&uri);
    let mut inner = state.inner.lock().await;
    if inner.failing_ids.contains(&id) {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": "database is locked" })),
        ));
    }
    let record = inner
        .records
        .iter_mut()
        .find(|(kind, record)| *kind == collection && record.id.0 == id)
        .map(|(_, record)| record)
        .ok_or_else(|| not_found("Question"))?;
    record.text = body["text"].as_str().unwrap_or_default().to_string();
    record.sort_order = body["sort_order"].as_i64().unwrap_or_default();
    Ok(Json(json!(record)))
}

async fn delete_child(
    State(state): State<MockState>,
    Path(id): Path<i64>,
    uri: Uri,
    headers: HeaderMap,
) -> ApiResult {
    state.note("DELETE", &uri, &headers, None).await;
    let collection = collection_of(&uri);
    let mut inner = state.inner.lock().await;
    if inner.failing_ids.contains(&id) {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": "database is locked" })),
        ));
    }
    let before = inner.records.len();
    inner
        .records
        .retain(|(kind, record)| !(*kind == collection && record.id.0 == id));
    if inner.records.len() == before {
        return Err(not_found("Question"));
    }
    Ok(Json(json!({ "message": "Question deleted" })))
}

async fn spawn_admin_server(state: MockState) -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new()
        .route("/admin/scenarios/", get(list_scenarios))
        .route("/admin/scenarios/:scenario_id", get(get_scenario))
        .route("/admin/scenarios/:scenario_id/:collection", get(list_children))
        .route("/admin/questions/", post(create_child))
        .route("/admin/ending_guidances/", post(create_child))
        .route("/admin/questions/:id", put(update_child).delete(delete_child))
        .route(
            "/admin/ending_guidances/:id",
            put(update_child).delete(delete_child),
        )
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}/admin/"))
}

async fn backend_for(state: &MockState) -> HttpAdminBackend {
    let api_base = spawn_admin_server(state.clone()).await.expect("spawn server");
    HttpAdminBackend::new(api_base).with_basic_auth("admin", Some("secret".to_string()))
}

#[test]
fn api_base_trailing_slash_is_trimmed() {
    let backend = HttpAdminBackend::new("http://localhost:8000/admin///");
    assert_eq!(backend.api_base(), "http://localhost:8000/admin");
}

#[tokio::test]
async fn lists_children_under_scenario_with_basic_auth() {
    let state = MockState::default();
    state.seed("questions", 2, "Second", 2).await;
    state.seed("questions", 1, "First", 1).await;
    state.seed("ending_guidances", 3, "Bye", 1).await;
    let backend = backend_for(&state).await;

    let records = backend
        .list_children(ChildKind::Question, ScenarioId(1))
        .await
        .expect("list");

    let texts: Vec<_> = records.iter().map(|record| record.text.as_str()).collect();
    assert_eq!(texts, ["First", "Second"]);
    let requests = state.requests().await;
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path, "/admin/scenarios/1/questions");
    assert_eq!(
        requests[0].authorization.as_deref(),
        Some("Basic YWRtaW46c2VjcmV0")
    );
}

#[tokio::test]
async fn create_posts_body_and_returns_assigned_id() {
    let state = MockState::default();
    state.seed("ending_guidances", 40, "existing", 1).await;
    let backend = backend_for(&state).await;

    let id = backend
        .create_child(
            ChildKind::EndingGuidance,
            &ChildWrite {
                text: "Goodbye".to_string(),
                sort_order: 2,
                scenario_id: ScenarioId(1),
                is_active: None,
            },
        )
        .await
        .expect("create");

    assert_eq!(id, ChildId(41));
    let requests = state.requests().await;
    assert_eq!(requests[0].path, "/admin/ending_guidances/");
    assert_eq!(
        requests[0].body,
        Some(json!({ "text": "Goodbye", "sort_order": 2, "scenario_id": 1 }))
    );
}

#[tokio::test]
async fn delete_of_missing_record_is_not_an_error() {
    let state = MockState::default();
    let backend = backend_for(&state).await;

    backend
        .delete_child(ChildKind::Question, ChildId(77))
        .await
        .expect("404 on delete is treated as already deleted");

    let requests = state.requests().await;
    assert_eq!(requests[0].method, "DELETE");
    assert_eq!(requests[0].path, "/admin/questions/77");
}

#[tokio::test]
async fn server_errors_surface_detail_message() {
    let state = MockState::default();
    state.seed("questions", 5, "A", 1).await;
    state.inner.lock().await.failing_ids.insert(5);
    let backend = backend_for(&state).await;

    let err = backend
        .delete_child(ChildKind::Question, ChildId(5))
        .await
        .expect_err("500 must fail");
    let api = err.downcast_ref::<ApiException>().expect("api exception");
    assert_eq!(api.code, ErrorCode::Internal);
    assert_eq!(api.message, "database is locked");
}

#[tokio::test]
async fn scenarios_list_and_fetch() {
    let state = MockState::default();
    let backend = backend_for(&state).await;

    let scenarios = backend.list_scenarios().await.expect("list");
    assert_eq!(scenarios.len(), 2);
    assert_eq!(scenarios[0].conversation_mode, "B");
    assert_eq!(scenarios[1].conversation_mode, "A");

    let scenario = backend.fetch_scenario(ScenarioId(1)).await.expect("fetch");
    assert_eq!(scenario.name, "Survey");

    let err = backend
        .fetch_scenario(ScenarioId(9))
        .await
        .expect_err("unknown scenario");
    assert!(err
        .downcast_ref::<ApiException>()
        .is_some_and(ApiException::is_not_found));
}

#[tokio::test]
async fn editor_round_trip_against_http_backend() {
    let state = MockState::default();
    state.seed("questions", 1, "A", 1).await;
    state.seed("questions", 2, "B", 2).await;
    let backend: Arc<dyn AdminBackend> = Arc::new(backend_for(&state).await);

    let mut editor = DraftEditor::new(ChildKind::Question, backend.clone());
    assert_eq!(editor.load(ScenarioId(1)).await, LoadOutcome::Loaded { count: 2 });

    editor.reorder(0, 1).expect("reorder");
    editor.add_draft("C").expect("add");
    editor.save(ScenarioId(1)).await.expect("save");

    let mut reloaded = DraftEditor::new(ChildKind::Question, backend);
    reloaded.load(ScenarioId(1)).await;
    let rows: Vec<_> = reloaded
        .items()
        .iter()
        .map(|item| (item.text().to_string(), item.sort_order()))
        .collect();
    assert_eq!(
        rows,
        [
            ("B".to_string(), 1),
            ("A".to_string(), 2),
            ("C".to_string(), 3)
        ]
    );

    let posted = state
        .requests()
        .await
        .into_iter()
        .filter(|request| request.method == "POST")
        .collect::<Vec<_>>();
    assert_eq!(posted.len(), 1);
    assert_eq!(
        posted[0].body,
        Some(json!({ "text": "C", "sort_order": 3, "scenario_id": 1, "is_active": true }))
    );
}

#[tokio::test]
async fn editor_reports_http_update_failure_per_item() {
    let state = MockState::default();
    state.seed("questions", 1, "A", 1).await;
    state.seed("questions", 2, "B", 2).await;
    state.inner.lock().await.failing_ids.insert(2);
    let mut editor = DraftEditor::new(ChildKind::Question, Arc::new(backend_for(&state).await));
    editor.load(ScenarioId(1)).await;

    let err = editor.save(ScenarioId(1)).await.expect_err("one update fails");
    match err {
        EditorError::SaveFailed(failure) => {
            assert_eq!(failure.saved, 1);
            assert_eq!(failure.failed.len(), 1);
            assert_eq!(failure.failed[0].id, Some(ChildId(2)));
            assert!(failure.failed[0].reason.contains("database is locked"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn load_of_missing_scenario_falls_back_to_empty() {
    let state = MockState::default();
    let mut editor = DraftEditor::new(
        ChildKind::EndingGuidance,
        Arc::new(backend_for(&state).await),
    );

    let outcome = editor.load(ScenarioId(404)).await;
    assert!(matches!(outcome, LoadOutcome::Unavailable { .. }));
    assert!(editor.items().is_empty());
}
