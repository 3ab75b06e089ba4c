pub mod report;
pub mod store;

pub use store::{list_runs, load_run, write_comparison, write_run};
