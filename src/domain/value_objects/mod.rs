pub mod comparator;
pub mod run_mode;
pub mod severity;

pub use comparator::Comparator;
pub use run_mode::RunMode;
pub use severity::Severity;
