//! `vaultbank-api` — HTTP transport over the ledger.
//!
//! A thin axum layer: request DTOs in, ledger calls, JSON out. No business
//! rule lives here; the handlers validate shape, resolve the authenticated
//! principal, and map ledger errors onto HTTP statuses.

pub mod app;
pub mod context;
pub mod middleware;
