mod context;
mod outcome;
mod request;
mod run;
mod scenario;
mod scorecard;
mod staffing;

pub use context::*;
pub use outcome::*;
pub use request::*;
pub use run::*;
pub use scenario::*;
pub use scorecard::*;
pub use staffing::*;
