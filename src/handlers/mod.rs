// src/handlers/mod.rs

pub mod admin;
pub mod auth;
pub mod quiz;
pub mod stats;
