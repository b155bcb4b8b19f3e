//! Shared fixtures for the workspace integration tests.

pub mod mock_feed;
