//! Time-record aggregation and reporting.
//!
//! Frames come in through the [`import`] parsers, are grouped by
//! [`aggregate::aggregate`] and turned into tables, matrices or HTML by
//! [`render`]. Storage and the current time are reached through the
//! [`store::FrameStore`] and [`clock::Clock`] ports.

pub mod aggregate;
pub mod clock;
pub mod dashboard;
pub mod domain;
mod error;
pub mod hierarchy;
pub mod import;
pub mod render;
pub mod rounding;
pub mod store;
pub mod timespan;

pub use error::*;
