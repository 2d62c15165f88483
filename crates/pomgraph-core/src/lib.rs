//! Core data types for pomgraph.
//!
//! This crate defines the value types shared by every other crate: Maven
//! artifact coordinates, the flat package model handed to the renderers,
//! and the scan configuration file.
//!
//! This crate is intentionally free of async code and network I/O.

pub mod artifact;
pub mod config;
pub mod package;
