//! Denomination keys and the RBI reference catalog

pub mod catalog;
pub mod denomination;

pub use catalog::{DetectionParams, ReferenceCatalog, ReferenceEntry, SecurityFeatureEntry};
pub use denomination::Denomination;
