#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # CourseHub
//!
//! HTTP JSON API for a course marketplace: browsing and enrolling in courses,
//! events, and projects; tutor and student profiles; paid checkout through a
//! hosted payment-provider page; and webhook reconciliation of completed
//! payments into enrollment records.
//!
//! ## Architecture
//!
//! Identity, persistence, and the payment lifecycle are owned by external
//! managed services. This crate is the glue between them:
//!
//! - [`config`] - layered configuration (defaults, TOML file, environment)
//! - [`database`] - PostgreSQL pool construction and embedded migrations
//! - [`models`] - one module per entity, plain SQLx persistence helpers
//! - [`payments`] - checkout-session provider client and webhook verification
//! - [`web`] - axum router, handlers, auth middleware, and error mapping

pub mod config;
pub mod database;
pub mod logging;
pub mod models;
pub mod payments;
pub mod web;
