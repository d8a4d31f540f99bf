//! Use-case services.
//!
//! # Responsibility
//! - Turn repository results into the caller-visible error taxonomy.
//! - Emit metadata-only `user_register` / `reservation_create` log events.
//!
//! # Invariants
//! - Services never bypass repository validation or transactions.
//! - Services never log passwords or other free-text input.

pub mod account_registrar;
pub mod reservation_recorder;
