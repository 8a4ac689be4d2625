//! Data models for the Pulseboard dashboard pipeline.
//!
//! This module contains the core data structures for detected signals,
//! vendor-neutral queries, and the assembled query bundle.

pub mod bundle;
pub mod query;
pub mod signal;

pub use bundle::{Bundle, BundleMetadata, ChangeSet};
pub use query::{Query, QueryType, TimeRange};
pub use signal::{Confidence, DetectorReport, DynamicMetric, RawSignal, SignalClass, SignalKind};
