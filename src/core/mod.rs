// src/core/mod.rs
pub mod constellation;
pub mod dataset;
pub mod engine;
pub mod types;
