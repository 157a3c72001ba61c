// src/devtools/mod.rs

pub mod mocks;
