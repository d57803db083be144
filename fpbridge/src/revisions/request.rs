//! Per-request inputs to the pipeline, as supplied by the host.

use std::collections::HashMap;

use axum::http::{HeaderMap, header};

use crate::settings::PageId;

/// Query parameters a revisions-complete link carries.
pub const EMAIL: &str = "email";
pub const SONG: &str = "song";
pub const PROJECT: &str = "project";
pub const FILEPASS: &str = "filepass";

/// All four parameters the page-load trigger requires.
pub const REQUIRED_PARAMS: [&str; 4] = [EMAIL, SONG, PROJECT, FILEPASS];

/// What the host knows about one inbound page view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundRequest {
    /// The `Referer` header, if one was sent and is valid text
    pub referrer: Option<String>,
    /// Decoded query-string parameters
    pub query: HashMap<String, String>,
    /// Page being served; `None` when the directive path runs outside a page
    pub current_page_id: Option<PageId>,
}

impl InboundRequest {
    pub fn new(headers: &HeaderMap, query: HashMap<String, String>, current_page_id: Option<PageId>) -> Self {
        let referrer = headers
            .get(header::REFERER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        Self {
            referrer,
            query,
            current_page_id,
        }
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// True when every parameter in `names` is present. An empty value counts as present.
    pub fn has_params(&self, names: &[&str]) -> bool {
        names.iter().all(|name| self.query.contains_key(*name))
    }

    /// Raw notification fields, if the three mandatory ones are present.
    pub fn fields(&self) -> Option<RevisionFields> {
        Some(RevisionFields {
            email: self.param(EMAIL)?.to_string(),
            song: self.param(SONG)?.to_string(),
            project: self.param(PROJECT)?.to_string(),
            filepass: self.param(FILEPASS).map(str::to_string),
        })
    }
}

/// Unsanitised notification fields lifted from the query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionFields {
    pub email: String,
    pub song: String,
    pub project: String,
    /// The directive path tolerates a missing file-pass link
    pub filepass: Option<String>,
}
