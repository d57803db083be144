//! JSON bodies sent to the webhook, and the field derivations behind them.

use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;

use crate::revisions::request::RevisionFields;
use crate::sanitize::{sanitize_email, sanitize_text_field};

/// Everything except RFC 3986 unreserved characters is encoded.
const SEGMENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// `MM/DD/YYYY HH:MM:SS`, 24-hour clock.
const DATE_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

const WAV: &str = ".wav";
const MP3: &str = ".mp3";

/// A revisions-complete notification, in one of the two shapes the webhook
/// scenario accepts. Field order is the wire order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NotificationPayload {
    /// Sent by the page-load trigger; every field is sanitised
    PageLoad {
        email: String,
        song: String,
        project: String,
        filepass: String,
    },
    /// Sent by the embedded directive
    Directive {
        email: String,
        song: String,
        project: String,
        filepass_url: String,
        date: String,
    },
}

/// Email, song and project after the sanitise step both payloads share.
struct SanitizedFields {
    email: String,
    song: String,
    project: String,
}

impl SanitizedFields {
    fn new(fields: &RevisionFields) -> Self {
        Self {
            email: sanitize_email(&fields.email),
            song: sanitize_text_field(&fields.song),
            project: sanitize_text_field(&fields.project),
        }
    }
}

impl NotificationPayload {
    /// Sanitise the raw fields for the page-load trigger. Never fails; a
    /// field that does not survive sanitisation is left empty.
    pub fn page_load(fields: &RevisionFields) -> Self {
        let SanitizedFields { email, song, project } = SanitizedFields::new(fields);
        NotificationPayload::PageLoad {
            email,
            song,
            project,
            filepass: sanitize_text_field(fields.filepass.as_deref().unwrap_or_default()),
        }
    }

    /// Derive the directive payload from the sanitised fields. The caller has
    /// already checked the email. The file-pass link is encoded, not sanitised.
    pub fn directive(fields: &RevisionFields, now: DateTime<Utc>) -> Self {
        let SanitizedFields { email, song, project } = SanitizedFields::new(fields);
        NotificationPayload::Directive {
            email,
            song: strip_song_extension(&song).to_string(),
            project,
            filepass_url: fields.filepass.as_deref().map(encode_filepass_url).unwrap_or_default(),
            date: format_date(now),
        }
    }

    /// Names of the fields that came out empty.
    pub fn empty_fields(&self) -> Vec<&'static str> {
        let fields: Vec<(&'static str, &str)> = match self {
            NotificationPayload::PageLoad {
                email,
                song,
                project,
                filepass,
            } => vec![
                ("email", email.as_str()),
                ("song", song.as_str()),
                ("project", project.as_str()),
                ("filepass", filepass.as_str()),
            ],
            NotificationPayload::Directive {
                email, song, project, ..
            } => vec![("email", email.as_str()), ("song", song.as_str()), ("project", project.as_str())],
        };

        fields.into_iter().filter(|(_, value)| value.is_empty()).map(|(name, _)| name).collect()
    }

    pub fn email(&self) -> &str {
        match self {
            NotificationPayload::PageLoad { email, .. } | NotificationPayload::Directive { email, .. } => email,
        }
    }
}

/// Drop the audio extension from a song file name.
///
/// The extension is `.wav` when that substring appears anywhere in the name,
/// otherwise `.mp3`; the name is cut at the first occurrence.
pub fn strip_song_extension(song: &str) -> &str {
    let extension = if song.contains(WAV) { WAV } else { MP3 };
    match song.find(extension) {
        Some(end) => &song[..end],
        None => song,
    }
}

/// Percent-encode the final `/`-separated segment of a file-pass link.
///
/// Earlier segments are assumed to be URL-safe already; the last one is a
/// file name and may contain spaces or other reserved characters.
pub fn encode_filepass_url(filepass: &str) -> String {
    let (prefix, file_name) = match filepass.rsplit_once('/') {
        Some((prefix, file_name)) => (Some(prefix), file_name),
        None => (None, filepass),
    };

    let encoded = utf8_percent_encode(file_name, SEGMENT_ENCODE_SET).to_string();
    match prefix {
        Some(prefix) => format!("{prefix}/{encoded}"),
        None => encoded,
    }
}

pub fn format_date(now: DateTime<Utc>) -> String {
    now.format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fields() -> RevisionFields {
        RevisionFields {
            email: "artist@example.com".to_string(),
            song: "Track One.wav".to_string(),
            project: "Debut EP".to_string(),
            filepass: Some("a/b/my file.mp3".to_string()),
        }
    }

    #[test]
    fn test_strip_song_extension() {
        assert_eq!(strip_song_extension("Track One.wav"), "Track One");
        assert_eq!(strip_song_extension("Track Two.mp3"), "Track Two");
        assert_eq!(strip_song_extension("Bounce.wav.mp3"), "Bounce");
        assert_eq!(strip_song_extension("Demo.mp3 (v2).mp3"), "Demo");
        assert_eq!(strip_song_extension("Untitled.flac"), "Untitled.flac");
        assert_eq!(strip_song_extension("LOUD.WAV"), "LOUD.WAV");
    }

    #[test]
    fn test_encode_filepass_url() {
        assert_eq!(encode_filepass_url("a/b/my file.mp3"), "a/b/my%20file.mp3");
        assert_eq!(
            encode_filepass_url("https://filepass.com/f/Mix & Master #2.wav"),
            "https://filepass.com/f/Mix%20%26%20Master%20%232.wav"
        );
        assert_eq!(encode_filepass_url("just a name.wav"), "just%20a%20name.wav");
        assert_eq!(encode_filepass_url("dir/"), "dir/");
        assert_eq!(encode_filepass_url("dir/caf\u{e9}~v1.wav"), "dir/caf%C3%A9~v1.wav");
    }

    #[test]
    fn test_format_date() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 17, 4, 9).unwrap();
        assert_eq!(format_date(at), "03/05/2024 17:04:09");
    }

    #[test]
    fn test_directive_payload_wire_format() {
        let at = Utc.with_ymd_and_hms(2024, 1, 31, 8, 0, 0).unwrap();
        let payload = NotificationPayload::directive(&fields(), at);

        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(
            json,
            r#"{"email":"artist@example.com","song":"Track One","project":"Debut EP","filepass_url":"a/b/my%20file.mp3","date":"01/31/2024 08:00:00"}"#
        );
    }

    #[test]
    fn test_directive_without_filepass_sends_empty_url() {
        let fields = RevisionFields {
            filepass: None,
            ..fields()
        };
        let payload = NotificationPayload::directive(&fields, Utc::now());
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["filepass_url"], "");
    }

    #[test]
    fn test_directive_payloads_differ_only_in_date() {
        let first = NotificationPayload::directive(&fields(), Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let second = NotificationPayload::directive(&fields(), Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap());

        let mut first = serde_json::to_value(&first).unwrap();
        let mut second = serde_json::to_value(&second).unwrap();
        assert_ne!(first["date"], second["date"]);

        first.as_object_mut().unwrap().remove("date");
        second.as_object_mut().unwrap().remove("date");
        assert_eq!(first, second);
    }

    #[test]
    fn test_page_load_payload_is_sanitised() {
        let fields = RevisionFields {
            email: " artist@example.com ".to_string(),
            song: "<b>Track One.wav</b>".to_string(),
            project: "Debut\tEP".to_string(),
            filepass: Some("abc123".to_string()),
        };
        let payload = NotificationPayload::page_load(&fields);

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({
                "email": "artist@example.com",
                "song": "Track One.wav",
                "project": "Debut EP",
                "filepass": "abc123",
            })
        );
        assert!(payload.empty_fields().is_empty());
    }

    #[test]
    fn test_page_load_reports_fields_emptied_by_sanitisation() {
        let fields = RevisionFields {
            email: "not-an-email".to_string(),
            song: "<br>".to_string(),
            project: "Debut EP".to_string(),
            filepass: Some("abc123".to_string()),
        };
        let payload = NotificationPayload::page_load(&fields);
        assert_eq!(payload.empty_fields(), vec!["email", "song"]);
        assert_eq!(payload.email(), "");
    }

    #[test]
    fn test_directive_payload_is_sanitised() {
        let fields = RevisionFields {
            email: " artist@example.com".to_string(),
            song: "<b>Track</b>\tOne.wav".to_string(),
            project: "<script>x()</script>Debut\u{7}EP".to_string(),
            filepass: Some("a/b/my file.mp3".to_string()),
        };
        let payload = NotificationPayload::directive(&fields, Utc.with_ymd_and_hms(2024, 1, 31, 8, 0, 0).unwrap());

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({
                "email": "artist@example.com",
                "song": "Track One",
                "project": "DebutEP",
                "filepass_url": "a/b/my%20file.mp3",
                "date": "01/31/2024 08:00:00",
            })
        );
    }

    #[test]
    fn test_page_load_is_deterministic() {
        assert_eq!(NotificationPayload::page_load(&fields()), NotificationPayload::page_load(&fields()));
    }
}
