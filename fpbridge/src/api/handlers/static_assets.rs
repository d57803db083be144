//! HTTP handler for the bundled stylesheet.

use axum::{
    http::header,
    response::IntoResponse,
};

const STYLESHEET: &str = include_str!("../../../assets/css/style.css");

/// Serve the stylesheet linked from every page
pub async fn stylesheet() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/css; charset=utf-8"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        STYLESHEET,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, http::StatusCode, routing::get};
    use axum_test::TestServer;

    #[tokio::test]
    async fn test_stylesheet_is_served_as_css() {
        let server = TestServer::new(Router::new().route("/assets/css/style.css", get(stylesheet))).unwrap();

        let response = server.get("/assets/css/style.css").await;

        response.assert_status(StatusCode::OK);
        assert_eq!(response.headers().get("content-type").unwrap(), "text/css; charset=utf-8");
        assert!(response.text().contains(".ysp_filepass"));
    }
}
