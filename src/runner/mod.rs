mod cancel;
mod evaluate;
mod orchestrator;
mod retry;

pub use cancel::CancellationToken;
pub use orchestrator::PlanningOrchestrator;
