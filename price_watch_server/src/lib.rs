//! # Price watch server
//! The HTTP front end of the price watch engine. It is responsible for:
//! * Letting buyers pre-authorize a payment and arm, inspect and cancel price watches.
//! * Running scan cycles, both periodically in the background and on demand through `POST /api/scan`.
//! * Escalating reconciliation anomalies to the operator log.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Identity
//! The server sits behind an auth proxy that sets the `pw_user_id` header. Requests without it are rejected.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/payments/authorize`, `/api/watches[/{id}[/history|/cancel]]`: buyer operations.
//! * `/api/scan`: run a scan cycle now.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod routes;
pub mod scan_worker;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
