pub mod files;
pub mod uploads;

use aide::axum::{
    routing::{delete, get, post},
    ApiRouter,
};

/// Creates the v1 API router with all v1 handler routes
pub fn handler() -> ApiRouter {
    ApiRouter::new()
        .api_route(
            "/uploads/signature",
            post(uploads::create_upload_signature),
        )
        .api_route("/files", delete(files::delete_file))
        .api_route("/files/url", get(files::get_file_url))
}
