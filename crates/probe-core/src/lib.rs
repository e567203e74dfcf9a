//! Probe Core - Foundation types for the Probe instrumentation agent.
//!
//! This crate provides:
//! - Product identity (name and version) shared by every component
//! - The reserved namespace the agent keeps for its own classes
//! - Dotted class-name validation and archive entry path mapping
//! - Property sources used as the process identity source

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod class_name;
pub mod error;
pub mod namespace;
pub mod product;
pub mod properties;

pub use class_name::ClassName;
pub use error::{CoreError, CoreResult};
pub use product::ProductInfo;
pub use properties::{MapProperties, PropertySource, SystemProperties};
