//! # Data Models
//!
//! One module per entity. Every row type derives `sqlx::FromRow` and exposes
//! async persistence helpers returning `Result<_, sqlx::Error>`; HTTP-level
//! error mapping happens at the handler seam, not here.

pub mod analytics;
pub mod course;
pub mod enrollment;
pub mod event;
pub mod newsletter;
pub mod payment;
pub mod profile;
pub mod project;

pub use analytics::AnalyticsEvent;
pub use course::Course;
pub use enrollment::Enrollment;
pub use event::Event;
pub use newsletter::NewsletterSubscription;
pub use payment::Payment;
pub use profile::UserProfile;
pub use project::Project;
