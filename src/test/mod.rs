//! Shared fixtures for the unit tests.

pub mod helpers;
