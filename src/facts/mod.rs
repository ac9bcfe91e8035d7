//! Static country facts.
//!
//! # Data Flow
//! ```text
//! raw path segment ("South-Korea")
//!     → normalize.rs (lowercase, hyphens → spaces)
//!     → tables.rs (animal / capital / currency / INR conversion lookup)
//!     → &'static record handed to the HTTP layer
//! ```
//!
//! # Design Decisions
//! - Tables are compiled into the binary and never mutated
//! - Every table is keyed by the normalized form, aliases are duplicated rows
//! - Lookups borrow; nothing here allocates except `normalize`

pub mod normalize;
pub mod tables;

pub use normalize::normalize;
pub use tables::{
    animal, capital, currency, inr_rate, AnimalFact, CapitalFact, CurrencyFact,
};
