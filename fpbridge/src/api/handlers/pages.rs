//! HTTP handler for served pages.
//!
//! Each page view first runs the page-load trigger, then renders the page with
//! its directives expanded. Neither step can fail the response once the page
//! is known.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Html,
};
use tracing::debug;

use crate::{
    AppState,
    errors::{Error, Result},
    pages::render_page,
    revisions::{InboundRequest, PageLoadOutcome},
    settings::PageId,
};

#[tracing::instrument(skip(state, headers, query))]
pub async fn get_page(
    State(state): State<AppState>,
    Path(page_id): Path<PageId>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Html<String>> {
    let page = state.pages.get(page_id).ok_or_else(|| Error::NotFound {
        resource: "Page".to_string(),
        id: page_id.to_string(),
    })?;

    let request = InboundRequest::new(&headers, query, Some(page_id));
    let settings = state.settings.snapshot();

    match state.notifier.on_page_load(&state.gate, &settings, &request).await {
        PageLoadOutcome::Sent { delivery, .. } => {
            debug!(status = delivery.status_code, "Page-load notification sent");
        }
        // Skips are traced by the notifier; transport failures were logged at error
        PageLoadOutcome::Skipped(_) | PageLoadOutcome::TransportFailed(_) => {}
    }

    let html = render_page(page, &state.notifier, &request)
        .await
        .map_err(|e| Error::Other(anyhow::Error::from(e).context(format!("render page {page_id}"))))?;
    Ok(Html(html))
}
