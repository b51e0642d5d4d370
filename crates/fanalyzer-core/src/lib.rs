//! Core types and trait definitions for the Fanalyzer stats service.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the domain model, the [`store::StatsStore`] abstraction, and the rating and
//! aggregation engine that runs on top of it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod cache;
pub mod engagement;
pub mod error;
pub mod geo;
pub mod post;
pub mod rating;
pub mod resolve;
pub mod sentiment;
pub mod social;
pub mod store;
pub mod user;

pub use error::{Error, Result};
