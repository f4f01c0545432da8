//! Config loading and on-disk persistence for the envelope game.

pub mod load;
pub mod store;

pub use load::*;
pub use store::*;
