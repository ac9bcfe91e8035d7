//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID / trace / timeout layers)
//!     → request.rs (request ID, client IP, headers for logging)
//!     → instrument.rs (normalize country, time, record, log)
//!         → handlers.rs (animal / capital / currency lookups)
//!         → exchange.rs (currency via dependency.rs + INR rate table)
//!     → response.rs (error taxonomy → status + JSON)
//!     → Send to client
//! ```

pub mod dependency;
pub mod exchange;
pub mod handlers;
pub mod instrument;
pub mod request;
pub mod response;
pub mod scrape;
pub mod server;
pub mod ui;

pub use request::{RequestDetails, RequestIdExt, RequestIdLayer, X_REQUEST_ID};
pub use response::ApiError;
pub use server::{AppState, HttpServer};
