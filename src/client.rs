use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::auth::{AwsCredentials, SigV4Auth, SigningRequest};
use crate::config::{ConfigError, ProviderSettings};

const SIGNING_SERVICE: &str = "chime";

/// Errors surfaced by the meeting provider
#[derive(Debug, Error)]
pub enum ChimeError {
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("provider returned {status} {code}: {message}")]
    Service {
        status: u16,
        code: String,
        message: String,
    },
    #[error("request to meeting provider failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to decode provider response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("meeting provider client is not configured: {0}")]
    Configuration(#[from] ConfigError),
}

// Provider resource types

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MediaPlacement {
    pub audio_host_url: Option<String>,
    pub audio_fallback_url: Option<String>,
    pub screen_data_url: Option<String>,
    pub screen_sharing_url: Option<String>,
    pub screen_viewing_url: Option<String>,
    pub signaling_url: Option<String>,
    pub turn_control_url: Option<String>,
    pub event_ingestion_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Meeting {
    pub meeting_id: String,
    #[serde(default)]
    pub external_meeting_id: Option<String>,
    #[serde(default)]
    pub media_placement: Option<MediaPlacement>,
    #[serde(default)]
    pub media_region: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AttendeeCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Attendee {
    pub attendee_id: String,
    #[serde(default)]
    pub external_user_id: Option<String>,
    #[serde(default)]
    pub join_token: Option<String>,
    #[serde(default)]
    pub capabilities: Option<AttendeeCapabilities>,
}

/// Key/value annotation attached to provider resources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NotificationsConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sns_topic_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sqs_queue_arn: Option<String>,
}

// Request types

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateMeetingRequest {
    pub client_request_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_meeting_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_host_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_region: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications_configuration: Option<NotificationsConfiguration>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateAttendeeRequest {
    pub external_user_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<AttendeeCapabilities>,
}

// Response types

/// A single-resource response. An unrecognized resource object decodes as `None`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MeetingResponse {
    #[serde(default, deserialize_with = "lenient")]
    pub meeting: Option<Meeting>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttendeeResponse {
    #[serde(default, deserialize_with = "lenient")]
    pub attendee: Option<Attendee>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListMeetingsResponse {
    #[serde(default)]
    pub meetings: Vec<Meeting>,
    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListAttendeesResponse {
    #[serde(default)]
    pub attendees: Vec<Attendee>,
    #[serde(default)]
    pub next_token: Option<String>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| serde_json::from_value(value).ok()))
}

/// The provider's meetings API, one method per round trip
#[async_trait]
pub trait ChimeApi: Send + Sync {
    async fn list_meetings(
        &self,
        max_results: u32,
        next_token: Option<String>,
    ) -> Result<ListMeetingsResponse, ChimeError>;

    async fn create_meeting(
        &self,
        request: &CreateMeetingRequest,
    ) -> Result<MeetingResponse, ChimeError>;

    async fn get_meeting(&self, meeting_id: &str) -> Result<MeetingResponse, ChimeError>;

    async fn delete_meeting(&self, meeting_id: &str) -> Result<(), ChimeError>;

    async fn list_attendees(
        &self,
        meeting_id: &str,
        max_results: u32,
        next_token: Option<String>,
    ) -> Result<ListAttendeesResponse, ChimeError>;

    async fn create_attendee(
        &self,
        meeting_id: &str,
        request: &CreateAttendeeRequest,
    ) -> Result<AttendeeResponse, ChimeError>;

    async fn get_attendee(
        &self,
        meeting_id: &str,
        attendee_id: &str,
    ) -> Result<AttendeeResponse, ChimeError>;

    async fn delete_attendee(&self, meeting_id: &str, attendee_id: &str)
        -> Result<(), ChimeError>;
}

/// Map a failed provider response to an error kind.
///
/// The error code comes from the `x-amzn-ErrorType` header or the body; the
/// HTTP status is only consulted when neither carries one.
pub fn classify_error(status: u16, error_type: Option<&str>, body: &str) -> ChimeError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    let code = error_type
        .map(|header| header.split(':').next().unwrap_or(header).to_string())
        .or_else(|| {
            parsed.as_ref().and_then(|json| {
                json.get("Code")
                    .or_else(|| json.get("__type"))
                    .and_then(Value::as_str)
                    .map(|code| code.rsplit('#').next().unwrap_or(code).to_string())
            })
        })
        .filter(|code| !code.is_empty());

    let message = parsed
        .as_ref()
        .and_then(|json| json.get("Message").or_else(|| json.get("message")))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status));

    match code.as_deref() {
        Some("ForbiddenException") | Some("Forbidden") => ChimeError::Forbidden(message),
        Some("NotFoundException") | Some("NotFound") => ChimeError::NotFound(message),
        Some("ValidationException") => ChimeError::Validation(message),
        Some(code) => ChimeError::Service {
            status,
            code: code.to_string(),
            message,
        },
        None => match status {
            403 => ChimeError::Forbidden(message),
            404 => ChimeError::NotFound(message),
            400 => ChimeError::Validation(message),
            _ => ChimeError::Service {
                status,
                code: "Unknown".to_string(),
                message,
            },
        },
    }
}

/// Client for the Amazon Chime meetings API
pub struct ChimeClient {
    client: Client,
    endpoint: String,
    host: String,
    region: String,
    credentials: AwsCredentials,
}

impl ChimeClient {
    pub fn new(settings: &ProviderSettings) -> Result<Self, ConfigError> {
        let url = Url::parse(&settings.endpoint)
            .map_err(|_| ConfigError::InvalidEndpoint(settings.endpoint.clone()))?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(ConfigError::InvalidEndpoint(settings.endpoint.clone())),
        };

        Ok(Self {
            client: Client::new(),
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            host,
            region: settings.region.clone(),
            credentials: settings.credentials.clone(),
        })
    }

    /// Sign and send a request, returning the response body on success
    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: Vec<(String, String)>,
        body: Option<String>,
    ) -> Result<String, ChimeError> {
        let body = body.unwrap_or_default();
        let signed = SigV4Auth::sign(
            &self.credentials,
            &SigningRequest {
                method: method.as_str(),
                host: &self.host,
                path,
                query: &query,
                body: &body,
                region: &self.region,
                service: SIGNING_SERVICE,
            },
            Utc::now(),
        );

        let query_string = SigV4Auth::canonical_query(&query);
        let url = if query_string.is_empty() {
            format!("{}{}", self.endpoint, path)
        } else {
            format!("{}{}?{}", self.endpoint, path, query_string)
        };

        debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method, &url)
            .header("Content-Type", "application/json")
            .header("X-Amz-Date", &signed.amz_date)
            .header("Authorization", &signed.authorization);

        if let Some(token) = &signed.security_token {
            request = request.header("X-Amz-Security-Token", token);
        }
        if !body.is_empty() {
            request = request.body(body);
        }

        let res = request.send().await?;
        let status = res.status();
        info!("Response received with status: {}", status);

        let error_type = res
            .headers()
            .get("x-amzn-errortype")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let text = res.text().await?;

        if status.is_success() {
            Ok(text)
        } else {
            let error = classify_error(status.as_u16(), error_type.as_deref(), &text);
            warn!("Meeting provider request failed: {}", error);
            Err(error)
        }
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: Vec<(String, String)>,
        body: Option<String>,
    ) -> Result<T, ChimeError> {
        let text = self.execute(method, path, query, body).await?;
        Ok(serde_json::from_str(&text)?)
    }
}

fn page_query(max_results: u32, next_token: Option<String>) -> Vec<(String, String)> {
    let mut query = vec![("max-results".to_string(), max_results.to_string())];
    if let Some(token) = next_token {
        query.push(("next-token".to_string(), token));
    }
    query
}

fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

#[async_trait]
impl ChimeApi for ChimeClient {
    async fn list_meetings(
        &self,
        max_results: u32,
        next_token: Option<String>,
    ) -> Result<ListMeetingsResponse, ChimeError> {
        info!("Making request to list meetings");
        self.execute_json(
            Method::GET,
            "/meetings",
            page_query(max_results, next_token),
            None,
        )
        .await
    }

    async fn create_meeting(
        &self,
        request: &CreateMeetingRequest,
    ) -> Result<MeetingResponse, ChimeError> {
        info!(
            "Making request to create meeting {}",
            request.client_request_token
        );
        let body = serde_json::to_string(request)?;
        self.execute_json(Method::POST, "/meetings", Vec::new(), Some(body))
            .await
    }

    async fn get_meeting(&self, meeting_id: &str) -> Result<MeetingResponse, ChimeError> {
        info!("Making request to get meeting {}", meeting_id);
        let path = format!("/meetings/{}", segment(meeting_id));
        self.execute_json(Method::GET, &path, Vec::new(), None).await
    }

    async fn delete_meeting(&self, meeting_id: &str) -> Result<(), ChimeError> {
        info!("Making request to delete meeting {}", meeting_id);
        let path = format!("/meetings/{}", segment(meeting_id));
        self.execute(Method::DELETE, &path, Vec::new(), None).await?;
        Ok(())
    }

    async fn list_attendees(
        &self,
        meeting_id: &str,
        max_results: u32,
        next_token: Option<String>,
    ) -> Result<ListAttendeesResponse, ChimeError> {
        info!("Making request to list attendees of meeting {}", meeting_id);
        let path = format!("/meetings/{}/attendees", segment(meeting_id));
        self.execute_json(
            Method::GET,
            &path,
            page_query(max_results, next_token),
            None,
        )
        .await
    }

    async fn create_attendee(
        &self,
        meeting_id: &str,
        request: &CreateAttendeeRequest,
    ) -> Result<AttendeeResponse, ChimeError> {
        info!(
            "Making request to create attendee {} in meeting {}",
            request.external_user_id, meeting_id
        );
        let path = format!("/meetings/{}/attendees", segment(meeting_id));
        let body = serde_json::to_string(request)?;
        self.execute_json(Method::POST, &path, Vec::new(), Some(body))
            .await
    }

    async fn get_attendee(
        &self,
        meeting_id: &str,
        attendee_id: &str,
    ) -> Result<AttendeeResponse, ChimeError> {
        info!(
            "Making request to get attendee {} of meeting {}",
            attendee_id, meeting_id
        );
        let path = format!(
            "/meetings/{}/attendees/{}",
            segment(meeting_id),
            segment(attendee_id)
        );
        self.execute_json(Method::GET, &path, Vec::new(), None).await
    }

    async fn delete_attendee(
        &self,
        meeting_id: &str,
        attendee_id: &str,
    ) -> Result<(), ChimeError> {
        info!(
            "Making request to delete attendee {} of meeting {}",
            attendee_id, meeting_id
        );
        let path = format!(
            "/meetings/{}/attendees/{}",
            segment(meeting_id),
            segment(attendee_id)
        );
        self.execute(Method::DELETE, &path, Vec::new(), None).await?;
        Ok(())
    }
}
