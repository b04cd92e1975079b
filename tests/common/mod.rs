//! Common test utilities

#![allow(dead_code)]

pub mod ringo_mock;
pub mod test_fixtures;

pub use ringo_mock::MockRingoServer;
pub use test_fixtures::{client_for, test_config, test_credentials};
