//! REST API handlers

pub mod status;
