use axum::http::HeaderMap;
use std::collections::HashMap;

use crate::client::Tag;
use crate::models::common::parse_flag;
use crate::models::meeting::Envelope;

/// What a handler knows about the inbound request
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Meeting id taken from the request path, if the route has one
    pub meeting_id: Option<String>,
    /// Attendee id taken from the request path, if the route has one
    pub attendee_id: Option<String>,
    /// Query string and body parameters, body values winning
    pub params: HashMap<String, String>,
    pub headers: HeaderMap,
}

impl RequestContext {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// `Some` only when the parameter is present and spells a boolean
    pub fn flag(&self, name: &str) -> Option<bool> {
        self.param(name).and_then(parse_flag)
    }
}

/// Extension points for the embedding application.
///
/// Every method has a default, so an application only overrides what it needs,
/// e.g. deriving request ids from the signed-in user or attaching its own
/// metadata to each record.
pub trait ApplicationHooks: Send + Sync {
    fn meeting_id_param(&self, ctx: &RequestContext) -> Option<String> {
        ctx.meeting_id.clone()
    }

    fn attendee_id_param(&self, ctx: &RequestContext) -> Option<String> {
        ctx.attendee_id.clone()
    }

    /// Request id used for the meeting's external id, and as the list filter
    fn meeting_request_id(&self, _ctx: &RequestContext) -> String {
        "default".to_string()
    }

    /// Request id used for the attendee's external user id
    fn attendee_request_id(&self, _ctx: &RequestContext) -> String {
        "default".to_string()
    }

    fn meeting_resources_path(&self) -> String {
        "/meetings".to_string()
    }

    fn meeting_resource_path(&self, meeting_id: &str) -> String {
        format!("/meetings/{}", meeting_id)
    }

    fn attendee_resources_path(&self, meeting_id: &str) -> String {
        format!("/meetings/{}/attendees", meeting_id)
    }

    fn attendee_resource_path(&self, meeting_id: &str, attendee_id: &str) -> String {
        format!("/meetings/{}/attendees/{}", meeting_id, attendee_id)
    }

    fn optional_meeting_tags(&self, _ctx: &RequestContext) -> Vec<Tag> {
        Vec::new()
    }

    fn optional_attendee_tags(&self, _ctx: &RequestContext) -> Vec<Tag> {
        Vec::new()
    }

    fn application_meeting_metadata(&self, _ctx: &RequestContext, _meeting: &Envelope) -> Envelope {
        Envelope::new()
    }

    fn application_attendee_metadata(
        &self,
        _ctx: &RequestContext,
        _attendee: &Envelope,
    ) -> Envelope {
        Envelope::new()
    }
}

/// Hooks with every default behavior
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl ApplicationHooks for DefaultHooks {}
