use tracing::{debug, info};

use crate::client::{ChimeError, Tag};
use crate::coordinator::{AttendeeOptions, MeetingCoordinator, MeetingOptions};
use crate::hooks::{ApplicationHooks, RequestContext};
use crate::models::common::resolve_flag;
use crate::models::meeting::{
    meeting_id_of, set_application_metadata, Envelope, ATTENDEE_KEY, MEETING_KEY,
};

pub const CREATE_MEETING_PARAM: &str = "create_meeting";
pub const CREATE_MEETING_WITH_ATTENDEE_PARAM: &str = "create_meeting_with_attendee";
pub const CREATE_ATTENDEE_FROM_MEETING_PARAM: &str = "create_attendee_from_meeting";

/// Meeting and attendee operations shared by the request handlers.
///
/// Sequences coordinator calls according to configuration and request flags,
/// and merges application metadata into every record exactly once.
pub struct Resources<'a> {
    coordinator: &'a MeetingCoordinator,
    hooks: &'a dyn ApplicationHooks,
}

impl<'a> Resources<'a> {
    pub fn new(coordinator: &'a MeetingCoordinator, hooks: &'a dyn ApplicationHooks) -> Self {
        Self { coordinator, hooks }
    }

    fn common_tags(&self) -> Vec<Tag> {
        let config = self.coordinator.config();
        vec![
            Tag::new("Application", config.application_name.as_str()),
            Tag::new("Environment", config.environment.as_str()),
        ]
    }

    pub fn meeting_tags(&self, ctx: &RequestContext) -> Vec<Tag> {
        let mut tags = self.common_tags();
        tags.extend(self.hooks.optional_meeting_tags(ctx));
        tags
    }

    pub fn attendee_tags(&self, ctx: &RequestContext) -> Vec<Tag> {
        let mut tags = self.common_tags();
        tags.extend(self.hooks.optional_attendee_tags(ctx));
        tags
    }

    fn merge_meeting_metadata(&self, ctx: &RequestContext, mut meeting: Envelope) -> Envelope {
        let metadata = self.hooks.application_meeting_metadata(ctx, &meeting);
        set_application_metadata(&mut meeting, MEETING_KEY, metadata);
        meeting
    }

    fn merge_attendee_metadata(&self, ctx: &RequestContext, mut attendee: Envelope) -> Envelope {
        let metadata = self.hooks.application_attendee_metadata(ctx, &attendee);
        set_application_metadata(&mut attendee, ATTENDEE_KEY, metadata);
        attendee
    }

    /// Meeting id from the request, or a validation error when there is none
    pub fn meeting_id(&self, ctx: &RequestContext) -> Result<String, ChimeError> {
        self.hooks
            .meeting_id_param(ctx)
            .ok_or_else(|| ChimeError::Validation("Meeting id is required".to_string()))
    }

    pub fn attendee_id(&self, ctx: &RequestContext) -> Result<String, ChimeError> {
        self.hooks
            .attendee_id_param(ctx)
            .ok_or_else(|| ChimeError::Validation("Attendee id is required".to_string()))
    }

    /// Whether a `GET /meetings` should create a meeting instead of listing
    pub fn should_create_meeting_on_index(&self, ctx: &RequestContext) -> bool {
        resolve_flag(
            ctx.flag(CREATE_MEETING_PARAM),
            self.coordinator.config().create_meeting_by_get_request,
        )
    }

    pub fn should_create_meeting_with_attendee(&self, ctx: &RequestContext) -> bool {
        resolve_flag(
            ctx.flag(CREATE_MEETING_WITH_ATTENDEE_PARAM),
            self.coordinator.config().create_meeting_with_attendee,
        )
    }

    pub fn should_create_attendee_from_meeting(&self, ctx: &RequestContext) -> bool {
        resolve_flag(
            ctx.flag(CREATE_ATTENDEE_FROM_MEETING_PARAM),
            self.coordinator.config().create_attendee_from_meeting,
        )
    }

    pub async fn list_meetings(&self, ctx: &RequestContext) -> Result<Vec<Envelope>, ChimeError> {
        let request_id = self.hooks.meeting_request_id(ctx);
        let meetings = self
            .coordinator
            .list_meetings(None, Some(&request_id))
            .await?;
        Ok(meetings
            .into_iter()
            .map(|meeting| self.merge_meeting_metadata(ctx, meeting))
            .collect())
    }

    pub async fn create_meeting(&self, ctx: &RequestContext) -> Result<Envelope, ChimeError> {
        let request_id = self.hooks.meeting_request_id(ctx);
        let options = MeetingOptions {
            tags: self.meeting_tags(ctx),
            ..Default::default()
        };
        let meeting = self.coordinator.create_meeting(&request_id, options).await?;
        info!(
            "Created meeting {} for request id {}",
            meeting_id_of(&meeting).unwrap_or("<unknown>"),
            request_id
        );
        Ok(self.merge_meeting_metadata(ctx, meeting))
    }

    pub async fn get_meeting(&self, ctx: &RequestContext) -> Result<Envelope, ChimeError> {
        let meeting_id = self.meeting_id(ctx)?;
        let meeting = self.coordinator.get_meeting(&meeting_id).await?;
        Ok(self.merge_meeting_metadata(ctx, meeting))
    }

    pub async fn delete_meeting(&self, ctx: &RequestContext) -> Result<String, ChimeError> {
        let meeting_id = self.meeting_id(ctx)?;
        self.coordinator.delete_meeting(&meeting_id).await?;
        info!("Deleted meeting {}", meeting_id);
        Ok(meeting_id)
    }

    pub async fn list_attendees(&self, ctx: &RequestContext) -> Result<Vec<Envelope>, ChimeError> {
        let meeting_id = self.meeting_id(ctx)?;
        let attendees = self.coordinator.list_attendees(&meeting_id, None).await?;
        Ok(attendees
            .into_iter()
            .map(|attendee| self.merge_attendee_metadata(ctx, attendee))
            .collect())
    }

    /// Create an attendee in `meeting_id`
    pub async fn create_attendee(
        &self,
        ctx: &RequestContext,
        meeting_id: &str,
    ) -> Result<Envelope, ChimeError> {
        let request_id = self.hooks.attendee_request_id(ctx);
        let options = AttendeeOptions {
            tags: self.attendee_tags(ctx),
            ..Default::default()
        };
        let attendee = self
            .coordinator
            .create_attendee(meeting_id, &request_id, options)
            .await?;
        info!(
            "Created attendee for request id {} in meeting {}",
            request_id, meeting_id
        );
        Ok(self.merge_attendee_metadata(ctx, attendee))
    }

    pub async fn get_attendee(&self, ctx: &RequestContext) -> Result<Envelope, ChimeError> {
        let meeting_id = self.meeting_id(ctx)?;
        let attendee_id = self.attendee_id(ctx)?;
        let attendee = self
            .coordinator
            .get_attendee(&meeting_id, &attendee_id)
            .await?;
        Ok(self.merge_attendee_metadata(ctx, attendee))
    }

    pub async fn delete_attendee(&self, ctx: &RequestContext) -> Result<(), ChimeError> {
        let meeting_id = self.meeting_id(ctx)?;
        let attendee_id = self.attendee_id(ctx)?;
        self.coordinator
            .delete_attendee(&meeting_id, &attendee_id)
            .await?;
        info!("Deleted attendee {} of meeting {}", attendee_id, meeting_id);
        Ok(())
    }

    /// Add a new attendee to an already fetched or created meeting, merging the
    /// `Attendee` record into the meeting envelope
    pub async fn create_attendee_from_meeting(
        &self,
        ctx: &RequestContext,
        mut meeting: Envelope,
    ) -> Result<Envelope, ChimeError> {
        let meeting_id = match meeting_id_of(&meeting) {
            Some(id) => id.to_string(),
            None => self.meeting_id(ctx)?,
        };
        let attendee = self.create_attendee(ctx, &meeting_id).await?;
        debug!("Merging attendee into meeting {}", meeting_id);
        meeting.extend(attendee);
        Ok(meeting)
    }

    pub async fn create_meeting_with_attendee(
        &self,
        ctx: &RequestContext,
    ) -> Result<Envelope, ChimeError> {
        let meeting = self.create_meeting(ctx).await?;
        self.create_attendee_from_meeting(ctx, meeting).await
    }
}
