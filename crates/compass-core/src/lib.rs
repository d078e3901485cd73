//! Core types and trait definitions for the political-compass quiz backend.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::Repository`]; the HTTP layer drives
//! the generic [`lifecycle::LifecycleManager`] and the [`quiz`] flow.

pub mod answer;
pub mod entity;
pub mod error;
pub mod filter;
pub mod lifecycle;
pub mod party;
pub mod question;
pub mod quiz;
pub mod result;
pub mod scoring;
pub mod source;
pub mod store;

pub use error::{Error, Result};
