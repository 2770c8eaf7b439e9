//! coursegate - subscription lifecycle and payment reconciliation.
//!
//! Tracks each user's trial and paid subscription, creates payment orders
//! through the gateway, verifies checkouts and reconciles gateway webhooks
//! into a single per-user record guarded by compare-and-swap updates.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
