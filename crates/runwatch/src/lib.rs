#![doc = include_str!("../../../README.md")]

//! This crate re-exports the event model and projector from `runwatch-core`
//! and the connection manager from `runwatch-client` behind a single entry
//! point.

pub use runwatch_core::*;

pub use runwatch_client as client;
