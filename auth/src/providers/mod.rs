//! Session adapters.
//!
//! This module defines traits for the external collaborators the coordinator
//! consumes. The host application implements them against its concrete identity
//! backend and platform storage; tests use the in-memory mocks.
//!
//! # Architecture
//!
//! ```text
//!                  ┌──────────────────┐
//!                  │   SessionStore   │
//!                  └───┬──────────┬───┘
//!        credentials   │          │   safe snapshot
//!                      ▼          ▼
//! ┌──────────────────────┐  ┌──────────────────────┐
//! │ IdentityProvider     │  │ SessionPersistence   │
//! │ - sign in / up / out │  │ - get / set / remove │
//! │ - token refresh      │  │   one JSON blob      │
//! │ - auth state stream  │  └──────────────────────┘
//! └──────────────────────┘
//! ```

pub mod identity;
pub mod persistence;

pub use identity::{AuthStateStream, IdentityProvider};
pub use persistence::SessionPersistence;
