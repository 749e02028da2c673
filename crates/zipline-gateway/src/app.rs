use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    create_url_handler, delete_url_by_code_handler, delete_url_by_id_handler,
    get_url_by_code_handler, get_url_by_id_handler, health_handler, list_urls_handler,
    redirect_handler, update_url_handler, update_url_status_handler,
};
use crate::state::AppState;

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/r/{code}", get(redirect_handler))
            .nest(
                "/api/urls",
                Router::new()
                    .route("/", post(create_url_handler).get(list_urls_handler))
                    .route(
                        "/id/{id}",
                        get(get_url_by_id_handler)
                            .put(update_url_handler)
                            .delete(delete_url_by_id_handler),
                    )
                    .route("/id/{id}/status", patch(update_url_status_handler))
                    .route(
                        "/code/{code}",
                        get(get_url_by_code_handler).delete(delete_url_by_code_handler),
                    ),
            )
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}
