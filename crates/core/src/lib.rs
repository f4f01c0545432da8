//! Core game logic for the lucky-money envelope game. Keep this crate free of
//! IO and platform concerns: storage, audio and rendering come in through the
//! traits in `storage`, `feedback` and `reveal`.

pub mod config;
pub mod events;
pub mod feedback;
pub mod fingerprint;
pub mod format;
pub mod gate;
pub mod prizes;
pub mod reveal;
pub mod rng;
pub mod scheduler;
pub mod storage;

pub use config::*;
pub use events::*;
pub use feedback::*;
pub use fingerprint::*;
pub use format::*;
pub use gate::*;
pub use prizes::*;
pub use reveal::*;
pub use rng::*;
pub use scheduler::*;
pub use storage::*;
