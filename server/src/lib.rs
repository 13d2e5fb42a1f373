// grocer_server/src/lib.rs

//! HTTP layer for the Grocer storefront: actix-web routes over the `grocer`
//! service layer. The binary in `main.rs` only wires configuration,
//! database and logging around `web::configure_app_routes`.

pub mod errors;
pub mod state;
pub mod web;

pub use errors::AppError;
pub use state::AppState;
pub use web::configure_app_routes;
