//! HTTP route handlers.

pub mod images;
