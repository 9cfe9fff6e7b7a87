//! Access control for Strata databases.
//!
//! This crate provides the [`AccessIndex`], the in-memory map from database
//! name to the users allowed to open transactions against it, and the
//! [`AccessPolicy`] naming who and what bypasses that map.
//!
//! The index is a cache of the grant edges stored in the catalog. It is
//! never persisted; after a restart it is rebuilt by reconciliation.

#![warn(missing_docs)]

mod index;

pub use index::{AccessIndex, AccessPolicy, DEFAULT_ADMIN_USER};
