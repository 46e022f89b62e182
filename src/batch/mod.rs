/// Ordered result delivery
pub mod aggregation;
/// Fan-out of slices onto Tokio tasks
pub mod scheduler;
/// Batch run configuration
pub mod types;
pub mod work;

pub use aggregation::BatchStream;
pub use scheduler::*;
pub use types::*;
pub use work::BatchWork;
