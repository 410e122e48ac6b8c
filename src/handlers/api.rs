use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::{header, HeaderMap},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use crate::coordinator::MeetingCoordinator;
use crate::hooks::{ApplicationHooks, RequestContext};
use crate::services::resources::Resources;

// AppState struct containing shared resources
pub struct AppState {
    pub coordinator: Arc<MeetingCoordinator>,
    pub hooks: Arc<dyn ApplicationHooks>,
}

impl AppState {
    pub fn new(coordinator: Arc<MeetingCoordinator>, hooks: Arc<dyn ApplicationHooks>) -> Self {
        Self { coordinator, hooks }
    }

    pub fn resources(&self) -> Resources<'_> {
        Resources::new(&self.coordinator, self.hooks.as_ref())
    }
}

/// How the client wants to be answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    Html,
}

impl ResponseFormat {
    /// A `format` parameter wins. Otherwise HTML when the Accept header weights
    /// `text/html` above `application/json`, or lists it first at equal weight.
    pub fn negotiate(ctx: &RequestContext) -> Self {
        match ctx.param("format") {
            Some("html") => return ResponseFormat::Html,
            Some("json") => return ResponseFormat::Json,
            _ => {}
        }

        let accept = ctx
            .headers
            .get(header::ACCEPT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        match (accept_weight(accept, "text/html"), accept_weight(accept, "application/json")) {
            (Some((html_q, html_pos)), Some((json_q, json_pos))) => {
                if html_q > json_q || (html_q == json_q && html_pos < json_pos) {
                    ResponseFormat::Html
                } else {
                    ResponseFormat::Json
                }
            }
            (Some((html_q, _)), None) if html_q > 0.0 => ResponseFormat::Html,
            _ => ResponseFormat::Json,
        }
    }
}

/// Quality and position of `media_type` in an Accept header, if listed
fn accept_weight(accept: &str, media_type: &str) -> Option<(f32, usize)> {
    accept.split(',').enumerate().find_map(|(pos, entry)| {
        let mut fields = entry.split(';').map(str::trim);
        if !fields.next()?.eq_ignore_ascii_case(media_type) {
            return None;
        }
        let q = fields
            .find_map(|field| field.strip_prefix("q="))
            .and_then(|q| q.parse::<f32>().ok())
            .unwrap_or(1.0);
        Some((q, pos))
    })
}

/// 303 redirect to `path` carrying a `notice` query parameter
pub fn redirect_with_notice(path: &str, notice: &str) -> Response {
    let separator = if path.contains('?') { '&' } else { '?' };
    let location = format!("{}{}notice={}", path, separator, urlencoding::encode(notice));
    Redirect::to(&location).into_response()
}

/// Query string plus body parameters of a request
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    pub params: HashMap<String, String>,
    pub headers: HeaderMap,
}

impl RequestParams {
    pub fn into_context(
        self,
        meeting_id: Option<String>,
        attendee_id: Option<String>,
    ) -> RequestContext {
        RequestContext {
            meeting_id,
            attendee_id,
            params: self.params,
            headers: self.headers,
        }
    }
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Scalar members of a JSON object body; nested values are not parameters
fn json_params(object: Map<String, Value>) -> HashMap<String, String> {
    object
        .into_iter()
        .filter_map(|(key, value)| scalar_to_string(value).map(|value| (key, value)))
        .collect()
}

fn content_type(headers: &HeaderMap) -> &str {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}

#[async_trait]
impl<S> FromRequest<S> for RequestParams
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = req.into_parts();
        let Query(mut params) =
            Query::<HashMap<String, String>>::from_request_parts(&mut parts, state)
                .await
                .map_err(IntoResponse::into_response)?;
        let headers = parts.headers.clone();
        let req = Request::from_parts(parts, body);

        let content_type = content_type(&headers);
        if content_type.starts_with("application/json") {
            let bytes = Bytes::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            if !bytes.is_empty() {
                let Json(object) =
                    Json::<Map<String, Value>>::from_bytes(&bytes).map_err(|rejection| {
                        warn!("Rejecting JSON body: {}", rejection.body_text());
                        rejection.into_response()
                    })?;
                params.extend(json_params(object));
            }
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(form) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|rejection| {
                    warn!("Rejecting form body: {}", rejection.body_text());
                    rejection.into_response()
                })?;
            params.extend(form);
        }

        Ok(Self { params, headers })
    }
}
