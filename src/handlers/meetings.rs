use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::handlers::api::{redirect_with_notice, AppState, RequestParams, ResponseFormat};
use crate::handlers::error::ApiError;
use crate::hooks::RequestContext;
use crate::models::meeting::meeting_id_of;

// List meetings endpoint, or create one when the request asks for it
pub async fn index(
    State(state): State<Arc<AppState>>,
    params: RequestParams,
) -> Result<Response, ApiError> {
    let ctx = params.into_context(None, None);
    let resources = state.resources();

    if resources.should_create_meeting_on_index(&ctx) {
        info!("Creating meeting from list request");
        return create_meeting(&state, &ctx).await;
    }

    info!("Received request to list meetings");
    let format = ResponseFormat::negotiate(&ctx);
    let meetings = resources
        .list_meetings(&ctx)
        .await
        .map_err(|err| ApiError::respond(err, format, state.hooks.as_ref()))?;

    info!("Successfully retrieved {} meetings", meetings.len());
    Ok(Json(json!({ "meetings": meetings })).into_response())
}

// Get meeting endpoint, optionally joining the caller as a new attendee
pub async fn show(
    State(state): State<Arc<AppState>>,
    Path(meeting_id): Path<String>,
    params: RequestParams,
) -> Result<Response, ApiError> {
    info!("Received request to get meeting: {}", meeting_id);
    let ctx = params.into_context(Some(meeting_id), None);
    let format = ResponseFormat::negotiate(&ctx);
    let resources = state.resources();

    let fetch = async {
        let meeting = resources.get_meeting(&ctx).await?;
        if resources.should_create_attendee_from_meeting(&ctx) {
            resources.create_attendee_from_meeting(&ctx, meeting).await
        } else {
            Ok(meeting)
        }
    };
    let meeting = fetch
        .await
        .map_err(|err| ApiError::respond(err, format, state.hooks.as_ref()))?;

    Ok(Json(meeting).into_response())
}

// Create meeting endpoint
pub async fn create(
    State(state): State<Arc<AppState>>,
    params: RequestParams,
) -> Result<Response, ApiError> {
    let ctx = params.into_context(None, None);
    create_meeting(&state, &ctx).await
}

async fn create_meeting(state: &AppState, ctx: &RequestContext) -> Result<Response, ApiError> {
    let format = ResponseFormat::negotiate(ctx);
    let resources = state.resources();

    let result = if resources.should_create_meeting_with_attendee(ctx) {
        info!("Received request to create meeting with attendee");
        resources.create_meeting_with_attendee(ctx).await
    } else {
        info!("Received request to create meeting");
        resources.create_meeting(ctx).await
    };
    let meeting = result.map_err(|err| ApiError::respond(err, format, state.hooks.as_ref()))?;

    let meeting_id = meeting_id_of(&meeting).unwrap_or_default().to_string();
    let location = state.hooks.meeting_resource_path(&meeting_id);

    Ok(match format {
        ResponseFormat::Html => redirect_with_notice(
            &location,
            &format!("Meeting <{}> was successfully created.", meeting_id),
        ),
        ResponseFormat::Json => (
            StatusCode::CREATED,
            [(header::LOCATION, location)],
            Json(meeting),
        )
            .into_response(),
    })
}

// Delete meeting endpoint
pub async fn destroy(
    State(state): State<Arc<AppState>>,
    Path(meeting_id): Path<String>,
    params: RequestParams,
) -> Result<Response, ApiError> {
    info!("Received request to delete meeting: {}", meeting_id);
    let ctx = params.into_context(Some(meeting_id), None);
    let format = ResponseFormat::negotiate(&ctx);

    let meeting_id = state
        .resources()
        .delete_meeting(&ctx)
        .await
        .map_err(|err| ApiError::respond(err, format, state.hooks.as_ref()))?;

    Ok(match format {
        ResponseFormat::Html => redirect_with_notice(
            &state.hooks.meeting_resources_path(),
            &format!("Meeting <{}> was successfully destroyed.", meeting_id),
        ),
        ResponseFormat::Json => StatusCode::NO_CONTENT.into_response(),
    })
}
