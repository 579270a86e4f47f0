//! Mock provider implementations for testing.
//!
//! This module provides simple, in-memory implementations of the adapter traits
//! for use in unit and integration tests.

pub mod identity;
pub mod persistence;

pub use identity::MockIdentityProvider;
pub use persistence::MockPersistence;
