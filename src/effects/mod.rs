//! Turn resolution.
//!
//! - `EffectResolver`: Applies a played card to source and target characters
//! - `Resolution`: Speech text, structured log entries, cancel flag
//! - `LogEntry`: One numeric detail of a resolution
//!
//! `AppliedEffects` (the record a cancel reverses) lives with `Character`
//! and is re-exported here.

mod log_entry;
mod resolver;

pub use log_entry::LogEntry;
pub use crate::core::AppliedEffects;
pub use resolver::{EffectResolver, Resolution, ResolverContext, COUNTER_BONUS};
