//! Image preprocessing module
//!
//! Produces the enhanced, denoised and binarized representation of a note
//! photograph that accompanies every analysis.

pub mod normalizer;

pub use normalizer::ImageNormalizer;
