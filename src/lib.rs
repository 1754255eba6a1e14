//! # Chat Backend Library
//!
//! Chat backend core with:
//! - A command mediator routing typed commands to handlers
//! - Phone sign-up with confirmation codes and RS256 access tokens
//! - A permission pipeline resolving bearer tokens to users
//! - Real-time chat sessions fanned out through a connection registry
//! - In-memory or PostgreSQL storage, in-memory or Redis code cache
//!
//! ## Architecture
//!
//! - **Domain Layer**: entities, value objects and repository traits
//! - **Application Layer**: commands, handlers, mediator, auth service
//! - **Infrastructure Layer**: storage, cache, code sender and metrics adapters
//! - **Presentation Layer**: HTTP handlers and WebSocket sessions
//!
//! ## Module Structure
//!
//! ```text
//! chat_backend/
//! +-- config/         Configuration management
//! +-- domain/         Entities, value objects, repository traits
//! +-- application/    Commands, mediator, auth service, DTOs
//! +-- infrastructure/ Memory/Postgres/Redis adapters, metrics
//! +-- presentation/   HTTP routes and WebSocket sessions
//! +-- shared/         Error types
//! ```

// Configuration module
pub mod config;

// Domain layer - Core business types
pub mod domain;

// Application layer - Commands and services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP and WebSocket handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
