pub mod setup;
pub mod viewers;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use setup::{TestSetup, TestSetupBuilder};
#[allow(unused_imports)]
pub use viewers::{as_rank_tuples, TestViewer};
