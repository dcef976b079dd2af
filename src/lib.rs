//! Core library for the `volley` CLI.
//!
//! This crate provides the building blocks used by the binary: CLI argument
//! types, configuration parsing, the validated run model, and the dispatch
//! engine (shared token-bucket rate limiter, per-request retry with backoff,
//! request fingerprinting and the worker pool). Engine events reach callers
//! through the [`metrics::RunObserver`] trait.
pub mod args;
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod metrics;
pub mod shutdown;
