//! Replay response rendering
//!
//! The edge proxy looks for a `fly-replay` header on the response and
//! re-issues the original request against the named instance. Two status
//! codes are in use in the wild: 409 for proxies that inspect every response,
//! and 302 for stacks that can only short-circuit with a redirect.

use axum::{
    http::{HeaderValue, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use ryw_core::ReplayDirective;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Header carrying the replay target
pub const REPLAY_HEADER: &str = "fly-replay";

/// Wire rendering for a replay directive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplayRendering {
    /// `409 Conflict` with the replay header
    #[default]
    Conflict,
    /// `302 Found` with the replay header and a `Location` back to the request
    Redirect,
}

impl FromStr for ReplayRendering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conflict" | "409" => Ok(Self::Conflict),
            "redirect" | "302" => Ok(Self::Redirect),
            other => Err(format!("unknown replay rendering: {other}")),
        }
    }
}

/// Build the response that hands the request to another instance
pub fn replay_response(directive: &ReplayDirective, rendering: ReplayRendering, uri: &Uri) -> Response {
    let replay = match HeaderValue::from_str(&directive.to_string()) {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(
                target_instance = %directive.target_instance,
                error = %e,
                "replay target is not a valid header value"
            );
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match rendering {
        ReplayRendering::Conflict => {
            (StatusCode::CONFLICT, [(REPLAY_HEADER, replay)]).into_response()
        }
        ReplayRendering::Redirect => {
            let location = uri
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or("/");
            let mut response = (StatusCode::FOUND, [(REPLAY_HEADER, replay)]).into_response();
            if let Ok(location) = HeaderValue::from_str(location) {
                response.headers_mut().insert(header::LOCATION, location);
            }
            response
        }
    }
}
