//! `vaultbank-infra` — persistence adapters.
//!
//! The relational implementation of the ledger's storage port lives here;
//! the dev/test in-memory implementation ships with the ledger crate so the
//! two stay swappable at process startup.

pub mod postgres;

pub use postgres::PostgresBankStore;
