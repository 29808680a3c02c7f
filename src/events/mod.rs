//! Random event engine
//!
//! Injects transient and persistent perturbations into a running conflict.

pub mod catalog;
pub mod generator;

pub use catalog::{EventCategory, EventTemplate, ALL_CATEGORIES};
pub use generator::{normalize_description, ActiveEvent, Event, EventEffects, EventGenerator};
