//! Configuration and data model shared by every operation

pub mod config;
pub mod models;
