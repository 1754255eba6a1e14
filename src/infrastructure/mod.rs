//! Infrastructure Layer
//!
//! Adapters for the contracts the core depends on:
//! - Repositories (in-memory store, PostgreSQL)
//! - Confirmation-code caches (in-memory, Redis)
//! - Code senders
//! - Prometheus metrics

pub mod cache;
pub mod database;
pub mod memory;
pub mod metrics;
pub mod repositories;
pub mod sender;
