//! Domain model (artifact, ids, outcomes, states, errors).

pub mod artifact;
pub mod errors;
pub mod ids;
pub mod outcome;
pub mod state;

pub use artifact::{Artifact, ListingPage};
pub use errors::{ApiError, ConfigError, ListError};
pub use ids::ArtifactId;
pub use outcome::{DeleteFailure, DeleteReport, PageOutcome, PurgeSummary};
pub use state::DeleteState;
