//! Use-case services over the observable store.
//!
//! # Responsibility
//! - Orchestrate store writes into note/folder/preferences operations.
//! - Enforce cross-entity invariants the raw store cannot see (dangling
//!   selection cleanup, offline change capture).
//!
//! # See also
//! - `store` for the raw path-level mutation API these services wrap.

pub mod workspace;
