//! Library entry for sdkbridge exposing core logic for integration tests
//! and embedding front-ends.

pub mod catalog;
pub mod config;
pub mod events;
pub mod parser;
pub mod runner;
pub mod session;
