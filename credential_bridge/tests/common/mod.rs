pub mod fixtures;

pub use fixtures::*;
pub use mock_providers::{Gate, MockProviderA, MockProviderB, MockSet, MockUi, MockValidator};
