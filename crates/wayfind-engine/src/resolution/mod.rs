pub mod engine;
pub mod plan;
pub mod result;

pub use engine::ResolutionEngine;
pub use plan::{PlannedStrategy, ResolutionPlan};
pub use result::{ResolutionOutcome, ResolveError};
