//! roster-admin library - team and content administration service
//!
//! Hosts one edit session over the reconciliation engine and exposes it,
//! the image picker, the image library and page content to the admin UI.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use roster_common::content::ContentStore;
use roster_common::library::ObjectStore;
use roster_common::picker::ImagePicker;
use roster_common::{EditSession, Reconciler};
use std::sync::Arc;
use tokio::sync::Mutex;

pub mod api;

/// Application state shared across HTTP handlers
///
/// Lock order when both are needed: `session`, then `picker`.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Reconciler>,
    pub session: Arc<Mutex<EditSession>>,
    pub picker: Arc<Mutex<ImagePicker>>,
    pub library: Arc<dyn ObjectStore>,
    pub content: Arc<ContentStore>,
    /// `None` disables the admin token check
    pub admin_token: Option<String>,
    /// Request body limit for image uploads
    pub upload_limit: usize,
}

impl AppState {
    pub fn new(
        engine: Arc<Reconciler>,
        session: EditSession,
        library: Arc<dyn ObjectStore>,
        content: ContentStore,
        admin_token: Option<String>,
        upload_limit: usize,
    ) -> Self {
        Self {
            engine,
            session: Arc::new(Mutex::new(session)),
            picker: Arc::new(Mutex::new(ImagePicker::new())),
            library,
            content: Arc::new(content),
            admin_token,
            upload_limit,
        }
    }
}

/// Build application router
///
/// `/health` and `/api/public/*` are open; everything else under `/api`
/// passes the admin token middleware.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post, put};

    // Room above the library limit so oversize uploads get a validation error
    let upload_body_limit = state.upload_limit.saturating_mul(2);

    let protected = Router::new()
        .route("/api/team", get(api::get_team))
        .route("/api/team/load", post(api::load_team))
        .route("/api/team/save", post(api::save_team))
        .route("/api/sections", post(api::add_section))
        .route(
            "/api/sections/:id",
            axum::routing::patch(api::update_section).delete(api::delete_section),
        )
        .route("/api/sections/:id/move", post(api::move_section))
        .route("/api/sections/:id/impact", get(api::section_impact))
        .route("/api/sections/:id/members", post(api::add_member))
        .route(
            "/api/members/:id",
            axum::routing::patch(api::update_member).delete(api::delete_member),
        )
        .route("/api/members/:id/move", post(api::move_member))
        .route("/api/members/:id/removal", get(api::member_removal))
        .route("/api/picker", get(api::picker_state))
        .route("/api/picker/open", post(api::open_picker))
        .route("/api/picker/select", post(api::select_image))
        .route("/api/picker/close", post(api::close_picker))
        .route(
            "/api/images",
            get(api::list_images)
                .post(api::upload_image)
                .layer(DefaultBodyLimit::max(upload_body_limit)),
        )
        .route("/api/images/:key", axum::routing::delete(api::delete_image))
        .route("/api/content", get(api::list_pages))
        .route("/api/content/:page", get(api::get_page))
        .route("/api/content/:page/:section", put(api::put_section))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    let public = Router::new()
        .route("/api/public/team", get(api::public_team))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .with_state(state)
}
