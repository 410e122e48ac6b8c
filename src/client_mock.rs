use async_trait::async_trait;
use mockall::mock;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::client::{
    Attendee, AttendeeResponse, ChimeApi, ChimeError, CreateAttendeeRequest,
    CreateMeetingRequest, ListAttendeesResponse, ListMeetingsResponse, MediaPlacement, Meeting,
    MeetingResponse,
};

// Define a mock client for the meetings API
mock! {
    pub ChimeClient {}

    #[async_trait]
    impl ChimeApi for ChimeClient {
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

        async fn delete_attendee(
            &self,
            meeting_id: &str,
            attendee_id: &str,
        ) -> Result<(), ChimeError>;
    }
}

pub fn sample_meeting(meeting_id: &str, external_meeting_id: &str) -> Meeting {
    Meeting {
        meeting_id: meeting_id.to_string(),
        external_meeting_id: Some(external_meeting_id.to_string()),
        media_placement: Some(MediaPlacement {
            audio_host_url: Some(format!("{}.audio.example.com:3478", meeting_id)),
            audio_fallback_url: Some(format!("wss://{}.audio.example.com:443", meeting_id)),
            screen_data_url: Some("wss://screen.example.com/v2/screen/".to_string()),
            screen_sharing_url: Some("wss://screen.example.com/v2/screen/".to_string()),
            screen_viewing_url: Some("wss://screen.example.com/ws/connect".to_string()),
            signaling_url: Some("wss://signal.example.com/control/".to_string()),
            turn_control_url: Some("https://ccp.example.com/v2/turn_sessions".to_string()),
            event_ingestion_url: None,
        }),
        media_region: Some("us-east-1".to_string()),
    }
}

// A simple in-memory store for our mock client
pub struct MockDataStore {
    meetings: Mutex<Vec<Meeting>>,
    attendees: Mutex<HashMap<String, Vec<Attendee>>>,
    created_meetings: Mutex<Vec<CreateMeetingRequest>>,
    created_attendees: Mutex<Vec<CreateAttendeeRequest>>,
}

impl MockDataStore {
    pub fn new() -> Self {
        Self {
            meetings: Mutex::new(Vec::new()),
            attendees: Mutex::new(HashMap::new()),
            created_meetings: Mutex::new(Vec::new()),
            created_attendees: Mutex::new(Vec::new()),
        }
    }

    pub fn insert_meeting(&self, meeting: Meeting) {
        self.meetings.lock().unwrap().push(meeting);
    }

    pub fn insert_attendee(&self, meeting_id: &str, attendee: Attendee) {
        self.attendees
            .lock()
            .unwrap()
            .entry(meeting_id.to_string())
            .or_default()
            .push(attendee);
    }

    pub fn meeting_count(&self) -> usize {
        self.meetings.lock().unwrap().len()
    }

    pub fn attendee_count(&self, meeting_id: &str) -> usize {
        self.attendees
            .lock()
            .unwrap()
            .get(meeting_id)
            .map_or(0, Vec::len)
    }

    /// Every create-meeting request the mock has received
    pub fn created_meetings(&self) -> Vec<CreateMeetingRequest> {
        self.created_meetings.lock().unwrap().clone()
    }

    /// Every create-attendee request the mock has received
    pub fn created_attendees(&self) -> Vec<CreateAttendeeRequest> {
        self.created_attendees.lock().unwrap().clone()
    }

    fn create_meeting(&self, request: &CreateMeetingRequest) -> Meeting {
        self.created_meetings.lock().unwrap().push(request.clone());
        let meeting_id = format!("meeting-{}", rand::random::<u32>());
        let external_id = request
            .external_meeting_id
            .clone()
            .unwrap_or_else(|| request.client_request_token.clone());
        let mut meeting = sample_meeting(&meeting_id, &external_id);
        meeting.media_region = request.media_region.clone();
        self.insert_meeting(meeting.clone());
        meeting
    }

    fn find_meeting(&self, meeting_id: &str) -> Option<Meeting> {
        self.meetings
            .lock()
            .unwrap()
            .iter()
            .find(|meeting| meeting.meeting_id == meeting_id)
            .cloned()
    }

    fn delete_meeting(&self, meeting_id: &str) -> bool {
        let mut meetings = self.meetings.lock().unwrap();
        let before = meetings.len();
        meetings.retain(|meeting| meeting.meeting_id != meeting_id);
        self.attendees.lock().unwrap().remove(meeting_id);
        meetings.len() != before
    }

    fn create_attendee(&self, meeting_id: &str, request: &CreateAttendeeRequest) -> Attendee {
        self.created_attendees.lock().unwrap().push(request.clone());
        let attendee = Attendee {
            attendee_id: format!("attendee-{}", rand::random::<u32>()),
            external_user_id: Some(request.external_user_id.clone()),
            join_token: Some(format!("join-token-{}", rand::random::<u64>())),
            capabilities: request.capabilities.clone(),
        };
        self.insert_attendee(meeting_id, attendee.clone());
        attendee
    }

    fn find_attendee(&self, meeting_id: &str, attendee_id: &str) -> Option<Attendee> {
        self.attendees
            .lock()
            .unwrap()
            .get(meeting_id)?
            .iter()
            .find(|attendee| attendee.attendee_id == attendee_id)
            .cloned()
    }

    fn delete_attendee(&self, meeting_id: &str, attendee_id: &str) -> bool {
        let mut attendees = self.attendees.lock().unwrap();
        match attendees.get_mut(meeting_id) {
            Some(list) => {
                let before = list.len();
                list.retain(|attendee| attendee.attendee_id != attendee_id);
                list.len() != before
            }
            None => false,
        }
    }

    /// Page through attendees; the token is the offset of the next page
    fn list_attendees(
        &self,
        meeting_id: &str,
        max_results: u32,
        next_token: Option<String>,
    ) -> (Vec<Attendee>, Option<String>) {
        let attendees = self.attendees.lock().unwrap();
        let all = attendees.get(meeting_id).cloned().unwrap_or_default();
        let start = next_token
            .and_then(|token| token.parse::<usize>().ok())
            .unwrap_or(0);
        let end = std::cmp::min(start + max_results as usize, all.len());
        let page = if start < all.len() {
            all[start..end].to_vec()
        } else {
            Vec::new()
        };
        let next = if end < all.len() {
            Some(end.to_string())
        } else {
            None
        };
        (page, next)
    }
}

fn meeting_not_found(meeting_id: &str) -> ChimeError {
    ChimeError::NotFound(format!("The meeting {} is not found", meeting_id))
}

fn attendee_not_found(attendee_id: &str) -> ChimeError {
    ChimeError::NotFound(format!("The attendee {} is not found", attendee_id))
}

// Helper function to set up a mock client with predefined behavior
pub fn setup_mock_client() -> (MockChimeClient, Arc<MockDataStore>) {
    let data_store = Arc::new(MockDataStore::new());
    let mut mock_client = MockChimeClient::new();

    let store = Arc::clone(&data_store);
    mock_client
        .expect_list_meetings()
        .returning(move |max_results, _next_token| {
            let meetings = store.meetings.lock().unwrap();
            Ok(ListMeetingsResponse {
                meetings: meetings.iter().take(max_results as usize).cloned().collect(),
                next_token: None,
            })
        });

    let store = Arc::clone(&data_store);
    mock_client
        .expect_create_meeting()
        .returning(move |request| {
            Ok(MeetingResponse {
                meeting: Some(store.create_meeting(request)),
            })
        });

    let store = Arc::clone(&data_store);
    mock_client
        .expect_get_meeting()
        .returning(move |meeting_id| match store.find_meeting(meeting_id) {
            Some(meeting) => Ok(MeetingResponse {
                meeting: Some(meeting),
            }),
            None => Err(meeting_not_found(meeting_id)),
        });

    let store = Arc::clone(&data_store);
    mock_client
        .expect_delete_meeting()
        .returning(move |meeting_id| {
            if store.delete_meeting(meeting_id) {
                Ok(())
            } else {
                Err(meeting_not_found(meeting_id))
            }
        });

    let store = Arc::clone(&data_store);
    mock_client
        .expect_list_attendees()
        .returning(move |meeting_id, max_results, next_token| {
            if store.find_meeting(meeting_id).is_none() {
                return Err(meeting_not_found(meeting_id));
            }
            let (attendees, next_token) = store.list_attendees(meeting_id, max_results, next_token);
            Ok(ListAttendeesResponse {
                attendees,
                next_token,
            })
        });

    let store = Arc::clone(&data_store);
    mock_client
        .expect_create_attendee()
        .returning(move |meeting_id, request| {
            if store.find_meeting(meeting_id).is_none() {
                return Err(meeting_not_found(meeting_id));
            }
            Ok(AttendeeResponse {
                attendee: Some(store.create_attendee(meeting_id, request)),
            })
        });

    let store = Arc::clone(&data_store);
    mock_client
        .expect_get_attendee()
        .returning(move |meeting_id, attendee_id| {
            match store.find_attendee(meeting_id, attendee_id) {
                Some(attendee) => Ok(AttendeeResponse {
                    attendee: Some(attendee),
                }),
                None => Err(attendee_not_found(attendee_id)),
            }
        });

    let store = Arc::clone(&data_store);
    mock_client
        .expect_delete_attendee()
        .returning(move |meeting_id, attendee_id| {
            if store.delete_attendee(meeting_id, attendee_id) {
                Ok(())
            } else {
                Err(attendee_not_found(attendee_id))
            }
        });

    (mock_client, data_store)
}
