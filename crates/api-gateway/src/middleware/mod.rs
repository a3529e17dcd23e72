//! HTTP middleware for the integration gateway

pub mod cors;

pub use cors::cors;
