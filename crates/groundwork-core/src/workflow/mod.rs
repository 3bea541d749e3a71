#[allow(clippy::module_inception)]
pub mod workflow;

pub use workflow::ResearchWorkflow;
