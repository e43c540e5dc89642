pub mod format;
pub mod sink;
pub mod trend;
