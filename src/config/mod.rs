//! # Configuration Module
//!
//! Configuration is layered from:
//! - Built-in defaults
//! - Configuration files (config/default.toml, config/{environment}.toml)
//! - Environment variables (prefixed with APP__)
//! - .env files (via dotenvy)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chat_backend::config::Settings;
//!
//! let settings = Settings::load()?;
//! println!("Server will listen on {}", settings.server_addr());
//! ```

mod settings;

pub use settings::*;
