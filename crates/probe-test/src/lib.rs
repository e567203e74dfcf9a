//! Probe Test - Shared test utilities for the Probe agent.
//!
//! This crate provides archive builders, mock implementations and test
//! helpers used across the Probe crates as a dev-dependency.
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! probe-test.workspace = true
//! ```
//!
//! Then use in your tests:
//!
//! ```rust,ignore
//! use probe_test::PluginArchiveBuilder;
//!
//! #[test]
//! fn test_reads_declared_packages() {
//!     let dir = tempfile::tempdir().unwrap();
//!     let path = PluginArchiveBuilder::new()
//!         .manifest_attribute("Probe-Plugin-Package", "com.example")
//!         .plugin("com.example.ExamplePlugin")
//!         .write_to(dir.path(), "example.tgz");
//!     // ...
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod archive;
pub mod home;
pub mod logs;
pub mod mocks;

pub use archive::*;
pub use home::*;
pub use logs::*;
pub use mocks::*;
