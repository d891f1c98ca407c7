// src/store/mod.rs

pub mod attempts;
pub mod questions;
pub mod stats;
