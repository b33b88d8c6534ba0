//! notify-core library.
//!
//! Notification aggregation engine: ingests a bulk batch and a live event
//! stream, combines related events, tracks seen state, orders records for
//! display, counts unseen items and runs the countdown for expiring
//! promotions. The entry point is [`engine::Engine`].
//!
//! # Conventions
//!
//! - **Errors**: public engine operations never fail; rejected input is
//!   logged and skipped. `anyhow::Result` is used for config and
//!   collaborator IO.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).

pub mod clock;
pub mod combine;
pub mod config;
pub mod countdown;
pub mod counter;
pub mod directory;
pub mod engine;
pub mod error;
pub mod filter;
pub mod host;
pub mod model;
pub mod render;
pub mod sort;
pub mod store;

pub use config::EngineConfig;
pub use engine::{Engine, LoadState, SeenOrigin};
pub use host::Collaborators;
