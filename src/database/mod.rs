//! # Database Layer
//!
//! PostgreSQL pool construction and embedded migrations.

pub mod connection;

pub use connection::{connect_lazy, create_pool, run_migrations};
