// Library exports for the binary and integration tests

pub mod config;
pub mod db;
pub mod import;
pub mod library;
pub mod paths;
pub mod settings;
pub mod watch;

// Test support (unit tests only)
#[cfg(test)]
pub mod test_support;
