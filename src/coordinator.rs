//! Meeting coordinator: the only component that talks to the meeting provider.
//!
//! Every identifier the coordinator creates on the provider side (client request
//! token, external meeting id, external user id) is the configured prefix followed
//! by a caller-chosen request id. The same prefix is used to filter meeting lists,
//! which keeps applications sharing one provider account out of each other's way.
//!
//! Provider errors are returned as-is; translating them into responses is left to
//! the handlers.

use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

use crate::client::{
    Attendee, AttendeeCapabilities, ChimeApi, ChimeClient, ChimeError, CreateAttendeeRequest,
    CreateMeetingRequest, Meeting, NotificationsConfiguration, Tag,
};
use crate::config::{Config, ProviderSettings};
use crate::models::meeting::{Envelope, ATTENDEE_KEY, MEETING_KEY};

/// Upper bound on provider round trips for one attendee listing
pub const MAX_ATTENDEE_PAGES: usize = 100;

type ClientFactory = Box<dyn Fn() -> Result<Arc<dyn ChimeApi>, ChimeError> + Send + Sync>;

/// Optional fields for meeting creation
#[derive(Debug, Clone, Default)]
pub struct MeetingOptions {
    /// Falls back to the configured media region
    pub media_region: Option<String>,
    pub meeting_host_id: Option<String>,
    pub tags: Vec<Tag>,
    pub notifications_configuration: Option<NotificationsConfiguration>,
}

/// Optional fields for attendee creation
#[derive(Debug, Clone, Default)]
pub struct AttendeeOptions {
    pub tags: Vec<Tag>,
    pub capabilities: Option<AttendeeCapabilities>,
}

pub struct MeetingCoordinator {
    config: Arc<Config>,
    client: RwLock<Option<Arc<dyn ChimeApi>>>,
    factory: ClientFactory,
}

impl MeetingCoordinator {
    /// Create a coordinator whose provider client is built by `factory` on first use
    pub fn new<F>(config: Arc<Config>, factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn ChimeApi>, ChimeError> + Send + Sync + 'static,
    {
        Self {
            config,
            client: RwLock::new(None),
            factory: Box::new(factory),
        }
    }

    /// Create a coordinator around an already constructed client
    pub fn with_client(config: Arc<Config>, client: Arc<dyn ChimeApi>) -> Self {
        let fallback = Arc::clone(&client);
        let coordinator = Self::new(config, move || Ok(Arc::clone(&fallback)));
        coordinator.reset_client(client);
        coordinator
    }

    /// Create a coordinator that talks to the real provider
    pub fn from_settings(config: Arc<Config>, settings: ProviderSettings) -> Self {
        Self::new(config, move || {
            info!("Initializing meeting provider client for {}", settings.endpoint);
            let client: Arc<dyn ChimeApi> = Arc::new(ChimeClient::new(&settings)?);
            Ok(client)
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Return the provider client, building it on first use.
    ///
    /// Two racing first calls may both run the factory; the last one stored wins.
    pub fn client(&self) -> Result<Arc<dyn ChimeApi>, ChimeError> {
        if let Some(client) = self
            .client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(Arc::clone(client));
        }

        let client = (self.factory)()?;
        *self.client.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&client));
        Ok(client)
    }

    /// Replace the provider client, mainly so tests can substitute a mock
    pub fn reset_client(&self, client: Arc<dyn ChimeApi>) {
        *self.client.write().unwrap_or_else(PoisonError::into_inner) = Some(client);
    }

    fn prefixed(&self, request_id: &str) -> String {
        format!("{}{}", self.config.prefix, request_id)
    }

    /// List meetings, keeping only those whose external id starts with
    /// `prefix + prefix_filter` when a filter is given
    pub async fn list_meetings(
        &self,
        max_results: Option<u32>,
        prefix_filter: Option<&str>,
    ) -> Result<Vec<Envelope>, ChimeError> {
        let max_results = max_results.unwrap_or(self.config.max_meeting_results);
        let response = self.client()?.list_meetings(max_results, None).await?;

        let filter = prefix_filter.map(|filter| self.prefixed(filter));
        let meetings: Vec<Envelope> = response
            .meetings
            .iter()
            .filter(|meeting| match &filter {
                Some(prefix) => meeting
                    .external_meeting_id
                    .as_deref()
                    .is_some_and(|id| id.starts_with(prefix.as_str())),
                None => true,
            })
            .map(|meeting| meeting_as_json(Some(meeting)))
            .collect();

        debug!(
            "Listed {} of {} meetings",
            meetings.len(),
            response.meetings.len()
        );
        Ok(meetings)
    }

    pub async fn create_meeting(
        &self,
        request_id: &str,
        options: MeetingOptions,
    ) -> Result<Envelope, ChimeError> {
        let external_id = self.prefixed(request_id);
        let request = CreateMeetingRequest {
            client_request_token: external_id.clone(),
            external_meeting_id: Some(external_id),
            meeting_host_id: options.meeting_host_id,
            media_region: Some(
                options
                    .media_region
                    .unwrap_or_else(|| self.config.media_region.clone()),
            ),
            tags: options.tags,
            notifications_configuration: options.notifications_configuration,
        };

        let response = self.client()?.create_meeting(&request).await?;
        Ok(meeting_as_json(response.meeting.as_ref()))
    }

    pub async fn get_meeting(&self, meeting_id: &str) -> Result<Envelope, ChimeError> {
        let response = self.client()?.get_meeting(meeting_id).await?;
        Ok(meeting_as_json(response.meeting.as_ref()))
    }

    pub async fn delete_meeting(&self, meeting_id: &str) -> Result<(), ChimeError> {
        self.client()?.delete_meeting(meeting_id).await
    }

    /// List every attendee of a meeting, following the provider's page tokens.
    /// `max_results` is the size of each page.
    ///
    /// Paging stops early when the provider hands back a token it already
    /// returned, or after `MAX_ATTENDEE_PAGES` pages; the attendees collected so
    /// far are returned in both cases.
    pub async fn list_attendees(
        &self,
        meeting_id: &str,
        max_results: Option<u32>,
    ) -> Result<Vec<Envelope>, ChimeError> {
        let max_results = max_results.unwrap_or(self.config.max_attendee_results);
        let client = self.client()?;

        let mut attendees = Vec::new();
        let mut seen_tokens = HashSet::new();
        let mut next_token: Option<String> = None;
        for page_number in 1..=MAX_ATTENDEE_PAGES {
            let page = client
                .list_attendees(meeting_id, max_results, next_token.take())
                .await?;
            attendees.extend(page.attendees.iter().map(|a| attendee_as_json(Some(a))));

            match page.next_token {
                Some(token) if !token.is_empty() => {
                    if !seen_tokens.insert(token.clone()) {
                        warn!(
                            "Provider repeated page token for meeting {}; stopping after {} pages",
                            meeting_id, page_number
                        );
                        break;
                    }
                    if page_number == MAX_ATTENDEE_PAGES {
                        warn!(
                            "Attendee listing of meeting {} truncated at {} pages",
                            meeting_id, MAX_ATTENDEE_PAGES
                        );
                    }
                    next_token = Some(token);
                }
                _ => break,
            }
        }

        debug!("Listed {} attendees of meeting {}", attendees.len(), meeting_id);
        Ok(attendees)
    }

    pub async fn create_attendee(
        &self,
        meeting_id: &str,
        request_id: &str,
        options: AttendeeOptions,
    ) -> Result<Envelope, ChimeError> {
        let request = CreateAttendeeRequest {
            external_user_id: self.prefixed(request_id),
            tags: options.tags,
            capabilities: options.capabilities,
        };

        let response = self.client()?.create_attendee(meeting_id, &request).await?;
        Ok(attendee_as_json(response.attendee.as_ref()))
    }

    pub async fn get_attendee(
        &self,
        meeting_id: &str,
        attendee_id: &str,
    ) -> Result<Envelope, ChimeError> {
        let response = self.client()?.get_attendee(meeting_id, attendee_id).await?;
        Ok(attendee_as_json(response.attendee.as_ref()))
    }

    pub async fn delete_attendee(&self, meeting_id: &str, attendee_id: &str) -> Result<(), ChimeError> {
        self.client()?.delete_attendee(meeting_id, attendee_id).await
    }
}

fn wrap(key: &str, fields: Value) -> Envelope {
    let mut envelope = Envelope::new();
    envelope.insert(key.to_string(), fields);
    envelope
}

/// Reshape a provider meeting into `{"Meeting": {...}}`; no meeting gives an empty map
pub fn meeting_as_json(meeting: Option<&Meeting>) -> Envelope {
    let Some(meeting) = meeting else {
        return Envelope::new();
    };

    let media_placement = meeting.media_placement.as_ref().map(|placement| {
        json!({
            "AudioHostUrl": placement.audio_host_url,
            "AudioFallbackUrl": placement.audio_fallback_url,
            "ScreenDataUrl": placement.screen_data_url,
            "ScreenSharingUrl": placement.screen_sharing_url,
            "ScreenViewingUrl": placement.screen_viewing_url,
            "SignalingUrl": placement.signaling_url,
            "TurnControlUrl": placement.turn_control_url,
            "EventIngestionUrl": placement.event_ingestion_url,
        })
    });

    wrap(
        MEETING_KEY,
        json!({
            "MeetingId": meeting.meeting_id,
            "ExternalMeetingId": meeting.external_meeting_id,
            "MediaPlacement": media_placement,
            "MediaRegion": meeting.media_region,
        }),
    )
}

/// Reshape a provider attendee into `{"Attendee": {...}}`; no attendee gives an empty map
pub fn attendee_as_json(attendee: Option<&Attendee>) -> Envelope {
    let Some(attendee) = attendee else {
        return Envelope::new();
    };

    let mut fields = json!({
        "ExternalUserId": attendee.external_user_id,
        "AttendeeId": attendee.attendee_id,
        "JoinToken": attendee.join_token,
    });
    if let (Some(capabilities), Some(object)) = (&attendee.capabilities, fields.as_object_mut()) {
        object.insert(
            "Capabilities".to_string(),
            json!({
                "Audio": capabilities.audio,
                "Video": capabilities.video,
                "Content": capabilities.content,
            }),
        );
    }

    wrap(ATTENDEE_KEY, fields)
}
