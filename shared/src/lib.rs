//! Pulseboard Shared Library
//!
//! This crate contains the core of the Pulseboard PR-dashboard
//! pipeline: it takes the observability signals an external detector
//! found in a change set and turns them into a vendor-neutral query
//! bundle plus a ready-to-import dashboard document.
//!
//! # Modules
//!
//! - [`models`] - Data models for signals, queries, and bundles
//! - [`limits`] - Per-type and panel-weight budget enforcement
//! - [`normalize`] - Signal-to-query normalization
//! - [`assemble`] - Bundle assembly
//! - [`render`] - Dashboard renderers
//! - [`pipeline`] - The signal-to-dashboard run loop
//!
//! # Example
//!
//! ```
//! use shared::limits::LimitMode;
//! use shared::models::{ChangeSet, RawSignal, SignalKind, TimeRange};
//! use shared::pipeline::DashboardPipeline;
//!
//! let pipeline = DashboardPipeline::grafana(LimitMode::Lenient);
//! let signals = vec![
//!     RawSignal::new(SignalKind::Counter, "orders_created", "app/models/order.rb"),
//! ];
//!
//! let output = pipeline
//!     .run(ChangeSet::new("feature/checkout"), signals, Vec::new(), TimeRange::default())
//!     .unwrap();
//! assert_eq!(output.dashboard.panels.len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod assemble;
pub mod limits;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod render;

/// Re-export common dependencies for convenience.
pub use chrono;
pub use serde;
pub use serde_json;
pub use validator;
