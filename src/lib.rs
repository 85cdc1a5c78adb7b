/// This is useful for the tests and the binary to be able to access the
/// pipeline stages directly.
pub mod cmake;
pub mod error;
pub mod repo;
pub mod report;
pub mod settings;
pub mod transcript;
pub mod utils;
