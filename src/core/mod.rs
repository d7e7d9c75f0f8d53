//! Configuration, shared models and the entity cache

pub mod cache;
pub mod config;
pub mod models;
