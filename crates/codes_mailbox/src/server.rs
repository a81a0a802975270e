use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::State;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use chrono::Utc;
use codes_logging::{codes_debug, codes_info};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::email::{IncomingEmail, RawEmail};
use crate::mailbox::Mailbox;

pub type SharedMailbox = Arc<Mutex<Mailbox>>;

/// `GET /api/codes`, `POST /api/delete`, `POST /api/emails`.
pub fn router(mailbox: SharedMailbox) -> Router {
    Router::new()
        .route("/api/codes", get(list_codes).options(preflight))
        .route("/api/delete", post(delete_all).options(preflight))
        .route("/api/emails", post(ingest_email).options(preflight))
        .fallback(unrouted)
        .method_not_allowed_fallback(unrouted)
        .layer(middleware::map_response(add_cors_headers))
        .with_state(mailbox)
}

pub async fn serve(listener: TcpListener, mailbox: SharedMailbox) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        codes_info!("mailbox listening on {}", addr);
    }
    axum::serve(listener, router(mailbox)).await
}

fn lock(mailbox: &SharedMailbox) -> MutexGuard<'_, Mailbox> {
    mailbox.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn list_codes(State(mailbox): State<SharedMailbox>) -> Json<Value> {
    let emails = lock(&mailbox).with_codes();
    codes_debug!("serving {} emails with codes", emails.len());
    Json(json!({ "success": true, "emails": emails }))
}

async fn delete_all(State(mailbox): State<SharedMailbox>) -> Json<Value> {
    let removed = lock(&mailbox).clear();
    codes_info!("deleted {} emails", removed);
    Json(json!({ "success": true, "message": "all emails deleted" }))
}

async fn ingest_email(
    State(mailbox): State<SharedMailbox>,
    Json(incoming): Json<IncomingEmail>,
) -> (StatusCode, Json<RawEmail>) {
    let email = RawEmail::receive(incoming, Utc::now().timestamp_millis());
    codes_info!(
        "received email {} for {} (code found: {})",
        email.id,
        email.to,
        email.has_verification_code
    );
    if let Some(evicted) = lock(&mailbox).push(email.clone()) {
        codes_debug!("evicted oldest email {}", evicted.id);
    }
    (StatusCode::CREATED, Json(email))
}

async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Preflight is answered on any path; everything else unrouted is a JSON 404.
async fn unrouted(method: Method) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::NO_CONTENT.into_response();
    }
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "message": "not found" })),
    )
        .into_response()
}

async fn add_cors_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, DELETE, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    response
}
