// src/lib.rs

pub mod async_actors;
pub mod config;
pub mod domain;
pub mod http_api;
pub mod model;

#[cfg(test)]
mod devtools;
