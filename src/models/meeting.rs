use serde_json::{Map, Value};

/// JSON envelope returned for meetings and attendees, e.g. `{"Meeting": {...}}`
pub type Envelope = Map<String, Value>;

pub const MEETING_KEY: &str = "Meeting";
pub const ATTENDEE_KEY: &str = "Attendee";
pub const APPLICATION_METADATA_KEY: &str = "ApplicationMetadata";

fn string_field<'a>(envelope: &'a Envelope, record: &str, field: &str) -> Option<&'a str> {
    envelope.get(record)?.get(field)?.as_str()
}

pub fn meeting_id_of(envelope: &Envelope) -> Option<&str> {
    string_field(envelope, MEETING_KEY, "MeetingId")
}

pub fn attendee_id_of(envelope: &Envelope) -> Option<&str> {
    string_field(envelope, ATTENDEE_KEY, "AttendeeId")
}

/// Attach application metadata to the named record.
///
/// Envelopes without that record (e.g. an empty reshape) are left untouched.
pub fn set_application_metadata(envelope: &mut Envelope, record: &str, metadata: Envelope) {
    if let Some(Value::Object(fields)) = envelope.get_mut(record) {
        fields.insert(APPLICATION_METADATA_KEY.to_string(), Value::Object(metadata));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(value: Value) -> Envelope {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_ids() {
        let meeting = envelope(json!({"Meeting": {"MeetingId": "m-1"}}));
        let attendee = envelope(json!({"Attendee": {"AttendeeId": "a-1"}}));
        assert_eq!(meeting_id_of(&meeting), Some("m-1"));
        assert_eq!(attendee_id_of(&attendee), Some("a-1"));
        assert_eq!(meeting_id_of(&attendee), None);
        assert_eq!(meeting_id_of(&Envelope::new()), None);
    }

    #[test]
    fn test_set_application_metadata() {
        let mut meeting = envelope(json!({"Meeting": {"MeetingId": "m-1"}}));
        set_application_metadata(&mut meeting, MEETING_KEY, envelope(json!({"room": 7})));
        assert_eq!(meeting["Meeting"]["ApplicationMetadata"]["room"], json!(7));

        let mut empty = Envelope::new();
        set_application_metadata(&mut empty, MEETING_KEY, Envelope::new());
        assert!(empty.is_empty());
    }
}
