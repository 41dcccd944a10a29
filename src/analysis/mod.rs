//! Result aggregation and verdict banding
//!
//! The aggregator runs the three detectors against the original image and
//! packages their outputs in a fixed order with fixed names, so downstream
//! code can rely on the shape of [`AggregateResult`].

pub mod aggregator;
pub mod verdict;

pub use aggregator::{AggregateResult, DebugOutput, FeatureAggregator, FeatureKind, FeatureResult};
pub use verdict::{FeatureStatus, Verdict};
