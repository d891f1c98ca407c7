// src/quiz/mod.rs

pub mod sampler;
pub mod scorer;
