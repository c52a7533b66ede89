//! HTTP conversion service.
//!
//! Exposes `POST /convert` for uploads and `GET /progress/{upload_id}` for
//! polling, on top of the [`crate::pipeline`] converter.

pub mod routes;
pub mod state;

pub use routes::{build_router, serve};
pub use state::AppState;
