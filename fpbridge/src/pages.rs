//! Pages served by the bridge and their rendering.

use std::collections::HashMap;

use askama::Template;
use serde::{Deserialize, Serialize};

use crate::revisions::{InboundRequest, Notifier};
use crate::settings::PageId;
use crate::shortcode::{self, Segment};

/// Stylesheet linked from every page; styles the directive's container.
pub const STYLESHEET_PATH: &str = "/assets/css/style.css";

/// A page as configured. `content` is trusted HTML that may contain directives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Page {
    pub id: PageId,
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default)]
pub struct PageRegistry {
    pages: HashMap<PageId, Page>,
}

impl PageRegistry {
    pub fn new(pages: impl IntoIterator<Item = Page>) -> Self {
        Self {
            pages: pages.into_iter().map(|page| (page.id, page)).collect(),
        }
    }

    pub fn get(&self, id: PageId) -> Option<&Page> {
        self.pages.get(&id)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Expand every directive in `content`, running the directive trigger for each.
pub async fn render_content(content: &str, notifier: &Notifier, request: &InboundRequest) -> String {
    let mut body = String::with_capacity(content.len());

    for segment in shortcode::parse(content) {
        match segment {
            Segment::Text(text) => body.push_str(text),
            Segment::Directive(directive) => {
                let fragment = notifier
                    .render_directive(directive.make_url(), &directive.content, request)
                    .await;
                body.push_str(&fragment);
            }
        }
    }

    body
}

/// HTML document around a page's rendered content. The title is escaped; the
/// body is trusted page content.
#[derive(Template)]
#[template(path = "page.html")]
struct PageTemplate<'a> {
    title: &'a str,
    stylesheet: &'a str,
    body: &'a str,
}

/// Full HTML document for `page`.
pub async fn render_page(page: &Page, notifier: &Notifier, request: &InboundRequest) -> Result<String, askama::Error> {
    let body = render_content(&page.content, notifier, request).await;

    PageTemplate {
        title: &page.title,
        stylesheet: STYLESHEET_PATH,
        body: &body,
    }
    .render()
}
