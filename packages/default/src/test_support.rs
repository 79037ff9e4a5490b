//! In-process mock of the Hydra HTTP API for tests.

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;

pub(crate) const COOKIE_VALUE: &str = "s3cr3t";

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: String,
    pub uri: String,
    pub cookie: Option<String>,
    pub accept: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Default)]
pub(crate) struct MockHydra {
    pub requests: Mutex<Vec<RecordedRequest>>,
    pub last_body: Mutex<Option<Value>>,
    pub build_polls: AtomicUsize,
    pub eval_polls: AtomicUsize,
}

impl MockHydra {
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.lock().last().cloned()
    }
}

/// Starts the mock on an ephemeral port and returns its base URL.
pub(crate) async fn spawn() -> (String, Arc<MockHydra>) {
    let state = Arc::new(MockHydra::default());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), state)
}

fn router(state: Arc<MockHydra>) -> Router {
    Router::new()
        .route("/", get(list_projects))
        .route("/login", post(login))
        .route(
            "/project/:id",
            get(get_project).put(put_project).delete(delete_project),
        )
        .route("/api/jobsets", get(list_jobsets))
        .route("/api/push", post(push))
        .route(
            "/jobset/:project/:jobset",
            get(get_jobset).put(put_jobset).delete(delete_jobset),
        )
        .route("/jobset/:project/:jobset/evals", get(jobset_evals))
        .route("/build/:id", get(get_build))
        .route("/build/:id/constituents", get(constituents))
        .route("/eval/:id", get(get_eval))
        .route("/eval/:id/builds", get(eval_builds))
        .route("/search", get(search))
        .route("/job/:project/:jobset/:job/shield", get(shield))
        .route("/slow", get(slow))
        .route("/malformed", get(malformed))
        .route("/empty", get(empty))
        .route("/teapot", get(teapot))
        .route("/rotate", get(rotate))
        .layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state)
}

async fn record(State(state): State<Arc<MockHydra>>, request: Request, next: Next) -> Response {
    // the borrow of `request` must end before the await
    let recorded = {
        let header_value = |name: header::HeaderName| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        RecordedRequest {
            method: request.method().to_string(),
            uri: request.uri().to_string(),
            cookie: header_value(header::COOKIE),
            accept: header_value(header::ACCEPT),
            user_agent: header_value(header::USER_AGENT),
        }
    };
    state.requests.lock().push(recorded);
    next.run(request).await
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn signed_in(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|c| c.contains(&format!("hydra_session={COOKIE_VALUE}")))
}

pub(crate) fn build_json(id: i64, job: &str, finished: Value, status: Value) -> Value {
    json!({
        "id": id,
        "nixname": format!("{job}-1.0"),
        "finished": finished,
        "buildstatus": status,
        "project": "nixpkgs",
        "jobset": "trunk",
        "job": job,
        "system": "x86_64-linux",
        "drvpath": format!("/nix/store/{id}-{job}.drv"),
        "starttime": 1700000000,
        "stoptime": 1700000300,
        "timestamp": 1699999900,
        "jobsetevals": [3],
        "priority": 100
    })
}

fn project_json(name: &str) -> Value {
    json!({
        "name": name,
        "displayname": "Nixpkgs",
        "owner": "admin",
        "description": "Nix Packages collection",
        "homepage": null,
        "enabled": true,
        "hidden": false,
        "jobsets": ["trunk", "staging"]
    })
}

fn jobset_json(project: &str, name: &str) -> Value {
    json!({
        "name": name,
        "project": project,
        "description": "Main development branch",
        "nixexprinput": "nixpkgs",
        "nixexprpath": "pkgs/top-level/release.nix",
        "enabled": 1,
        "visible": true,
        "keepnr": 3,
        "checkinterval": 300,
        "schedulingshares": 100,
        "inputs": {
            "nixpkgs": {"name": "nixpkgs", "type": "git", "value": "https://github.com/NixOS/nixpkgs.git", "emailresponsible": false}
        }
    })
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["username"] == "admin" && body["password"] == "secret" {
        (
            StatusCode::OK,
            [(
                header::SET_COOKIE,
                format!("hydra_session={COOKIE_VALUE}; Path=/; HttpOnly"),
            )],
            Json(json!({
                "username": "admin",
                "fullname": "Hydra Admin",
                "emailaddress": "admin@example.com",
                "userroles": ["admin"]
            })),
        )
            .into_response()
    } else {
        error(StatusCode::FORBIDDEN, "Bad username or password.")
    }
}

async fn list_projects() -> Response {
    let mut second = project_json("hydra");
    second["displayname"] = json!("Hydra");
    Json(json!([project_json("nixpkgs"), second])).into_response()
}

async fn get_project(Path(id): Path<String>) -> Response {
    match id.as_str() {
        "nixpkgs" | "my project" => Json(project_json(&id)).into_response(),
        _ => error(StatusCode::NOT_FOUND, "Project not found"),
    }
}

async fn put_project(
    State(state): State<Arc<MockHydra>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !signed_in(&headers) {
        return error(StatusCode::FORBIDDEN, "This page requires you to sign in.");
    }
    *state.last_body.lock() = Some(body);
    (
        StatusCode::CREATED,
        Json(json!({"uri": format!("/project/{id}"), "name": id, "redirect": format!("/project/{id}"), "type": "project"})),
    )
        .into_response()
}

async fn delete_project(headers: HeaderMap) -> Response {
    if !signed_in(&headers) {
        return error(StatusCode::FORBIDDEN, "This page requires you to sign in.");
    }
    Json(json!({"redirect": "/"})).into_response()
}

async fn list_jobsets(Query(params): Query<HashMap<String, String>>) -> Response {
    match params.get("project").map(String::as_str) {
        Some("nixpkgs") => Json(json!([
            {"name": "trunk", "project": "nixpkgs", "nrtotal": 10, "nrfailed": 1, "nrscheduled": 2, "haserrormsg": false, "errortime": null, "lastcheckedtime": 1700000000, "checkinterval": 300},
            {"name": "staging", "project": "nixpkgs", "nrtotal": 4, "nrfailed": 0, "nrscheduled": 0, "haserrormsg": true, "fetcherrormsg": "boom", "lastcheckedtime": 1700000000, "checkinterval": 600}
        ]))
        .into_response(),
        _ => Json(json!([])).into_response(),
    }
}

async fn push(Query(params): Query<HashMap<String, String>>) -> Response {
    let triggered: Vec<&str> = params
        .get("jobsets")
        .map(|s| s.split(',').collect())
        .unwrap_or_default();
    Json(json!({ "jobsetsTriggered": triggered })).into_response()
}

async fn get_jobset(Path((project, jobset)): Path<(String, String)>) -> Response {
    if project == "nixpkgs" {
        Json(jobset_json(&project, &jobset)).into_response()
    } else {
        error(StatusCode::NOT_FOUND, "Jobset not found")
    }
}

async fn put_jobset(
    State(state): State<Arc<MockHydra>>,
    Path((project, jobset)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !signed_in(&headers) {
        return error(StatusCode::FORBIDDEN, "This page requires you to sign in.");
    }
    *state.last_body.lock() = Some(body);
    Json(json!({"redirect": format!("/jobset/{project}/{jobset}"), "name": jobset, "type": "jobset"}))
        .into_response()
}

async fn delete_jobset(headers: HeaderMap) -> Response {
    if !signed_in(&headers) {
        return error(StatusCode::FORBIDDEN, "This page requires you to sign in.");
    }
    Json(json!({"redirect": "/project/nixpkgs"})).into_response()
}

async fn jobset_evals(
    State(state): State<Arc<MockHydra>>,
    Path((_project, jobset)): Path<(String, String)>,
) -> Response {
    match jobset.as_str() {
        // eval 1 has broken builds, eval 3 holds the jobs
        "trunk" => Json(json!({
            "first": "?page=1",
            "last": "?page=1",
            "evals": [
                {"1": {"id": 1, "builds": [90], "hasnewbuilds": true}},
                {"3": {"id": 3, "builds": [123, 124], "hasnewbuilds": 1}}
            ]
        }))
        .into_response(),
        "pending" => {
            let poll = state.eval_polls.fetch_add(1, Ordering::SeqCst);
            let evals = if poll == 0 {
                json!([{"7": {"id": 7, "builds": []}}])
            } else {
                json!([{"8": {"id": 8, "builds": [800, 801]}}, {"7": {"id": 7, "builds": []}}])
            };
            Json(json!({"first": "?page=1", "last": "?page=1", "evals": evals})).into_response()
        }
        "stalled" => Json(json!({"evals": [{"7": {"id": 7, "builds": []}}]})).into_response(),
        // eval 6 has builds but is older than eval 9
        "shuffled" => Json(json!({"evals": [
            {"9": {"id": 9, "builds": []}},
            {"4": {"id": 4, "builds": []}},
            {"6": {"id": 6, "builds": [60]}}
        ]}))
        .into_response(),
        _ => Json(json!({"evals": []})).into_response(),
    }
}

async fn get_build(State(state): State<Arc<MockHydra>>, Path(id): Path<i64>) -> Response {
    match id {
        123 => Json(build_json(123, "hello", json!(true), json!(0))).into_response(),
        124 => Json(build_json(124, "failing", json!(1), json!(1))).into_response(),
        // finishes on the third poll
        200 => {
            let poll = state.build_polls.fetch_add(1, Ordering::SeqCst);
            if poll < 2 {
                Json(build_json(200, "slow", json!(0), Value::Null)).into_response()
            } else {
                Json(build_json(200, "slow", json!(1), json!(0))).into_response()
            }
        }
        // never finishes
        201 => Json(build_json(201, "stuck", json!(false), Value::Null)).into_response(),
        _ => error(StatusCode::NOT_FOUND, "Build not found"),
    }
}

async fn constituents(Path(id): Path<i64>) -> Response {
    match id {
        123 => Json(json!([build_json(124, "failing", json!(true), json!(1))])).into_response(),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response(),
    }
}

async fn get_eval(Path(id): Path<i64>) -> Response {
    match id {
        3 => Json(json!({"id": 3, "timestamp": 1699999000, "hasnewbuilds": true, "builds": [123, 124]}))
            .into_response(),
        _ => error(StatusCode::NOT_FOUND, "Evaluation not found"),
    }
}

async fn eval_builds(Path(id): Path<i64>) -> Response {
    match id {
        // raw text keeps the keys in non-alphabetical wire order
        3 => (
            [(header::CONTENT_TYPE, "application/json")],
            format!(
                r#"[{{"hello": {}, "failing": {}}}]"#,
                build_json(123, "hello", json!(true), json!(0)),
                build_json(124, "failing", json!(1), json!(1))
            ),
        )
            .into_response(),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "database unavailable").into_response(),
    }
}

async fn search(Query(params): Query<HashMap<String, String>>) -> Response {
    let query = params.get("query").cloned().unwrap_or_default();
    if query == "nothing" {
        return Json(json!({"projects": [], "jobsets": [], "builds": [], "buildsdrv": []}))
            .into_response();
    }
    Json(json!({
        "projects": [project_json("nixpkgs")],
        "jobsets": [jobset_json("nixpkgs", "trunk")],
        "builds": [build_json(123, "hello", json!(true), json!(0))],
        "buildsdrv": [build_json(124, "failing", json!(1), json!(1))]
    }))
    .into_response()
}

async fn shield(Path((_project, _jobset, job)): Path<(String, String, String)>) -> Response {
    Json(json!({"schemaVersion": 1, "label": job, "message": "passing", "color": "green"}))
        .into_response()
}

async fn slow() -> Response {
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(json!([])).into_response()
}

async fn malformed() -> Response {
    (StatusCode::OK, "{not json").into_response()
}

async fn empty() -> Response {
    StatusCode::OK.into_response()
}

async fn teapot() -> Response {
    (StatusCode::IM_A_TEAPOT, "I'm a teapot").into_response()
}

/// Sets a different session cookie on an ordinary GET.
async fn rotate() -> Response {
    (
        [(header::SET_COOKIE, "hydra_session=other; Path=/")],
        Json(json!([])),
    )
        .into_response()
}
