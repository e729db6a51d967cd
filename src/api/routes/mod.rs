//! Route handlers, one module per resource.

pub mod cache;
pub mod compare;
pub mod health;
pub mod metrics;
pub mod optimize;
pub mod pricing;
pub mod templates;
