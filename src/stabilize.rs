//! Temporal stabilization of plate readings across frames.

mod engine;
mod lock;
mod smoother;
mod store;
mod voter;

pub use engine::{
    FrameReport, NO_PLATE_TEXT, PlateObservation, Preview, PreviewSource, StabilizationEngine,
};
pub use lock::{LockMachine, LockState, LockTransition};
pub use smoother::BoxSmoother;
pub use store::KeyedStore;
pub use voter::{
    BurstReading, BurstVote, READING_PLACEHOLDER, TemporalVoter, TextHistory, vote_burst,
};
