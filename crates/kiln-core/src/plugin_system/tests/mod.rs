mod common;
pub mod loader_tests;
pub mod version_tests;
