use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::client::ChimeError;
use crate::handlers::api::{redirect_with_notice, AppState, RequestParams, ResponseFormat};
use crate::handlers::error::ApiError;
use crate::models::meeting::attendee_id_of;

// List attendees endpoint
pub async fn index(
    State(state): State<Arc<AppState>>,
    Path(meeting_id): Path<String>,
    params: RequestParams,
) -> Result<Json<serde_json::Value>, ApiError> {
    info!("Received request to list attendees of meeting: {}", meeting_id);
    let ctx = params.into_context(Some(meeting_id), None);
    let format = ResponseFormat::negotiate(&ctx);

    let attendees = state
        .resources()
        .list_attendees(&ctx)
        .await
        .map_err(|err| ApiError::respond(err, format, state.hooks.as_ref()))?;

    info!("Successfully retrieved {} attendees", attendees.len());
    Ok(Json(json!({ "attendees": attendees })))
}

// Get attendee endpoint
pub async fn show(
    State(state): State<Arc<AppState>>,
    Path((meeting_id, attendee_id)): Path<(String, String)>,
    params: RequestParams,
) -> Result<Response, ApiError> {
    info!(
        "Received request to get attendee {} of meeting {}",
        attendee_id, meeting_id
    );
    let ctx = params.into_context(Some(meeting_id), Some(attendee_id));
    let format = ResponseFormat::negotiate(&ctx);

    let attendee = state
        .resources()
        .get_attendee(&ctx)
        .await
        .map_err(|err| ApiError::respond(err, format, state.hooks.as_ref()))?;
    Ok(Json(attendee).into_response())
}

// Create attendee endpoint
pub async fn create(
    State(state): State<Arc<AppState>>,
    Path(meeting_id): Path<String>,
    params: RequestParams,
) -> Result<Response, ApiError> {
    info!("Received request to create attendee in meeting: {}", meeting_id);
    let ctx = params.into_context(Some(meeting_id), None);
    let format = ResponseFormat::negotiate(&ctx);
    let resources = state.resources();

    let create = async {
        let meeting_id = resources.meeting_id(&ctx)?;
        let attendee = resources.create_attendee(&ctx, &meeting_id).await?;
        Ok::<_, ChimeError>((meeting_id, attendee))
    };
    let (meeting_id, attendee) = create
        .await
        .map_err(|err| ApiError::respond(err, format, state.hooks.as_ref()))?;

    let attendee_id = attendee_id_of(&attendee).unwrap_or_default();
    let location = state.hooks.attendee_resource_path(&meeting_id, attendee_id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(attendee),
    )
        .into_response())
}

// Delete attendee endpoint
pub async fn destroy(
    State(state): State<Arc<AppState>>,
    Path((meeting_id, attendee_id)): Path<(String, String)>,
    params: RequestParams,
) -> Result<Response, ApiError> {
    info!(
        "Received request to delete attendee {} of meeting {}",
        attendee_id, meeting_id
    );
    let ctx = params.into_context(Some(meeting_id.clone()), Some(attendee_id.clone()));
    let format = ResponseFormat::negotiate(&ctx);

    state
        .resources()
        .delete_attendee(&ctx)
        .await
        .map_err(|err| ApiError::respond(err, format, state.hooks.as_ref()))?;

    Ok(match format {
        ResponseFormat::Html => redirect_with_notice(
            &state.hooks.attendee_resources_path(&meeting_id),
            &format!("Attendee <{}> was successfully destroyed.", attendee_id),
        ),
        ResponseFormat::Json => StatusCode::NO_CONTENT.into_response(),
    })
}
