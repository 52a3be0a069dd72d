pub mod error;
pub mod models;

// Enforcement domain modules
pub mod case;
pub mod merge;
pub mod schema;
pub mod workflow;

pub use error::*;
pub use models::*;

pub use case::*;
pub use merge::*;
pub use schema::*;
