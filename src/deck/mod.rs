//! Deck and hand management.

pub mod manager;

pub use manager::DeckManager;
