/// Linked cancellation and cause attribution
pub mod arbiter;
/// Deadline-bound execution of a single unit of work
pub mod runner;

pub use arbiter::*;
pub use runner::*;
