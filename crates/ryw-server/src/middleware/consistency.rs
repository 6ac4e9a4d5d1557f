//! Transactional consistency middleware
//!
//! Reads run the consistency engine against the client's `txnum` cookie.
//! Writes are replayed to the primary straight away on a replica; on the
//! primary they run and the response gets a fresh cookie.

use crate::RywServer;
use crate::middleware::replay::replay_response;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, Method, Response as HttpResponse, header},
    middleware::Next,
    response::Response,
};
use ryw_core::{ConsistencyDecision, cookie};
use std::sync::Arc;

/// Whether `method` may change state
pub fn is_mutation(method: &Method) -> bool {
    !matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

/// All `Cookie` headers joined the way a single header would carry them
fn cookie_header(headers: &HeaderMap) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.join("; "))
    }
}

fn append_set_cookie<B>(response: &mut HttpResponse<B>, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => tracing::warn!(error = %e, "transaction cookie is not a valid header value"),
    }
}

/// Consistency middleware handler for Axum
pub async fn transactional_consistency(
    State(server): State<Arc<RywServer>>,
    request: Request,
    next: Next,
) -> Response {
    if is_mutation(request.method()) {
        if let Some(directive) = server.gate.require_primary().await {
            return replay_response(&directive, server.rendering, request.uri());
        }

        let mut response = next.run(request).await;
        let status = response.status();
        if status.is_success() || status.is_redirection() {
            let minted = server.gate.mint_post_write_cookie().await;
            append_set_cookie(&mut response, &minted);
        }
        return response;
    }

    let cookies = cookie_header(request.headers());
    match server.engine.decide(cookies.as_deref()).await {
        ConsistencyDecision::Proceed => next.run(request).await,
        ConsistencyDecision::Stripped => {
            let mut response = next.run(request).await;
            let deletion = cookie::delete_cookie(server.gate.cookie_attributes());
            append_set_cookie(&mut response, &deletion);
            response
        }
        ConsistencyDecision::Replay(directive) => {
            replay_response(&directive, server.rendering, request.uri())
        }
    }
}
