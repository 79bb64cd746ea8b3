//! # Cricket Tracker
//!
//! A local cricket squad tracker with a minimal HTTP stats API.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (players, match records)
//! - **registry**: The in-memory ordered player collection
//! - **calculate**: Derived statistics computation
//! - **payload**: Wire payload construction
//! - **api**: Request parsing, routing and response rendering
//! - **storage**: Flat-file persistence of the registry
//! - **server**: TCP transport boundary
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod config;
pub mod models;
pub mod payload;
pub mod registry;
pub mod server;
pub mod storage;

pub use models::*;
