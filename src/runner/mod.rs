//! Setup orchestration.

pub mod setup;

pub use setup::{
    show_detection, show_verification, Detection, RunOptions, RunOutcome, SetupRunner,
};
