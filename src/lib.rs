//! Frametrim - a Discord bot that trims frames and downsizes oversized images.
//!
//! The crate watches a single channel (and its threads) for image attachments,
//! crops uniform white borders or calibrated frame layouts, downsizes images
//! whose longer side exceeds the configured cap, and replies with the result.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing the event coordinator and use cases.
pub mod application;
/// Domain layer containing entities, errors, ports and pure image services.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "frametrim";
