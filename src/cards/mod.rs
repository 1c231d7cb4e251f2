//! Card system: templates, instances, and the catalog.
//!
//! ## Key Types
//!
//! - `CardTemplate`: Immutable card data, parsed into a `CardKind`
//! - `CardKind`: Closed sum of what a card does (attack, defense, evasion, repeat)
//! - `CardInstance`: A clone of a template with play state
//! - `CardCatalog`: The template pools loaded from JSON

pub mod catalog;
pub mod definition;
pub mod instance;

pub use catalog::{CardCatalog, Pool};
pub use definition::{
    AttackTarget, CardKind, CardTemplate, Category, DefenseKind, EvasionKind, RawCard,
    DEFAULT_MIRROR_MODIFIER,
};
pub use instance::{CardInstance, RawInstance};
