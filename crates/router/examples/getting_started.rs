use arc_router::extract::{Path, Query};
use arc_router::params::{ParamType, Value};
use arc_router::router::{get, post};
use arc_router::{blocking_fn, handler_fn, Dispatcher, DispatcherConfig, Json, Request, Router};
use http::{Method, StatusCode};
use http_body_util::BodyExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Deserialize, Debug)]
struct ListParams {
    limit: i64,
    tag: Vec<String>,
    verbose: bool,
}

#[derive(Serialize)]
struct User {
    id: i64,
    name: String,
}

// GET /users?limit=2&tag=a&tag=b&verbose=yes
async fn list_users(Query(params): Query<ListParams>) -> String {
    format!("listing {} users tagged {:?}, verbose: {}", params.limit, params.tag, params.verbose)
}

// GET /users/7
async fn get_user(Path(id): Path<i64>) -> Json<User> {
    Json(User { id, name: format!("user-{id}") })
}

// POST /users/7/posts/3
async fn create_post(method: Method, Path((user, post)): Path<(i64, i64)>) -> (StatusCode, String) {
    (StatusCode::CREATED, format!("{method} post {post} of user {user}"))
}

// GET /report, runs on the blocking pool
fn build_report() -> String {
    std::thread::sleep(Duration::from_millis(20));
    "report ready".to_owned()
}

// GET /wait, returns once the request times out
async fn wait(token: CancellationToken) -> &'static str {
    token.cancelled().await;
    "gave up waiting"
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let api = Router::builder()
        .route(
            "/users",
            get(handler_fn(list_users)
                .optional("limit", ParamType::Integer, 10)
                .optional("tag", ParamType::list(ParamType::String), Value::Array(Vec::new()))
                .optional("verbose", ParamType::Boolean, false)),
        )
        .route("/users/{id}", get(handler_fn(get_user).param("id", ParamType::Integer)))
        .route(
            "/users/{user}/posts/{post}",
            post(handler_fn(create_post).param("user", ParamType::Integer).param("post", ParamType::Integer)),
        )
        .route("/report", get(blocking_fn(build_report)))
        .route("/wait", get(handler_fn(wait)));

    let router = Router::builder().mount("/api", api).build().expect("valid routes");

    let config: DispatcherConfig =
        serde_json::from_str(r#"{"max_blocking_handlers": 4, "request_timeout_ms": 100}"#).expect("valid config");
    let dispatcher = Dispatcher::builder().router(router).config(&config).build().expect("valid config");

    let requests = [
        (Method::GET, "/api/users?limit=2&tag=a&tag=b&verbose=yes"),
        (Method::GET, "/api/users/7"),
        (Method::GET, "/api/users/seven"),
        (Method::POST, "/api/users/7/posts/3"),
        (Method::DELETE, "/api/users/7"),
        (Method::GET, "/api/report"),
        (Method::GET, "/api/wait"),
    ];

    for (method, uri) in requests {
        let response = match dispatcher.dispatch(Request::from_uri(method.clone(), uri)).await {
            Ok(response) => response,
            Err(e) => {
                info!(%method, uri, cause = %e, "handler failed");
                continue;
            }
        };

        let status = response.status();
        let body = response.into_body().collect().await.expect("body is in memory").to_bytes();
        info!(%method, uri, %status, body = %String::from_utf8_lossy(&body), "dispatched");
    }
}
