//! HTTP gateway for the zipline URL shortener.
//!
//! Exposes the management API under `/api/urls`, the public redirect
//! under `/r/{code}`, and a liveness probe under `/health`. Handlers are
//! thin: they translate HTTP to [`zipline_service::UrlService`] calls
//! and map service errors onto status codes.

pub mod app;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod model;
pub mod state;

pub use app::App;
pub use state::AppState;
