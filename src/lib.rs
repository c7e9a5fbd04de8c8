//! `ebics-nexus`: a bank-communication gateway bridging a Taler-style
//! wire-gateway HTTP API to EBICS-speaking banks.
//!
//! The protocol engine and persistence live in their own workspace
//! crates (`ebics-crypto`, `ebics-codec`, `ebics-protocol`, `iso20022`,
//! `payment-domain`, `nexus-db`, `nexus-scheduler`, `nexus-gateway`).
//! This crate is the binary-only wiring: CLI, configuration, telemetry,
//! and graceful shutdown, following the split the teacher draws between
//! its reusable `x402` library crate and the thin `src/main.rs` that
//! assembles one.
//!
//! # Modules
//!
//! - [`config`] — typed configuration loaded from the TOML file named by
//!   `--config`.
//! - [`sig_down`] — SIGTERM/SIGINT handling via a shared cancellation
//!   token.
//! - [`telemetry`] — `tracing-subscriber` setup.

pub mod config;
pub mod sig_down;
pub mod telemetry;
