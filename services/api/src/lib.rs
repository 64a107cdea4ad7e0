//! Interview API Library Crate
//!
//! This library contains the HTTP surface of the interview engine: the
//! application state and session store, API handlers, and routing. The `api`
//! binary is a thin wrapper around this library.

pub mod config;
pub mod handlers;
pub mod models;
pub mod router;
pub mod state;
