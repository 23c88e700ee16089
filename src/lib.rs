//! Energy-monitoring service for buildings.
//!
//! Buildings and their time-stamped readings live in a document store
//! ([`store`]); [`service`] implements listing, predictions and the optimize
//! transition on top of it, and [`api`] exposes them over HTTP.

pub mod api;
#[cfg(feature = "client")]
pub mod client;
pub mod config;
pub mod demo;
pub mod error;
pub mod io;
pub mod model;
pub mod service;
pub mod store;
#[cfg(feature = "tui")]
pub mod tui;
