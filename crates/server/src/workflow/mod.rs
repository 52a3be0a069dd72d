pub mod engine;

pub use engine::{apply_reopen, apply_update, AssignmentChange, UpdateOutcome};
