pub mod analyzer;
pub mod planner;
pub mod prompt;
pub mod retriever;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use analyzer::IntakeAnalyzer;
pub use planner::ClarificationPlanner;
pub use retriever::{NullRetriever, PrecedentRetriever, VectorRetriever};
pub use session::SessionStore;
