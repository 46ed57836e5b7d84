//! Deal management core for a merchant cash advance funding desk.
//!
//! The interesting machinery lives in [`underwriting`]: the decision
//! engine that grades merchant risk, detects stacked positions, prices
//! structured offers, and drives the audited deal lifecycle. The
//! remaining modules carry service plumbing: environment configuration,
//! tracing setup, and the crate-level error surface.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod underwriting;
