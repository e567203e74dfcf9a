//! Prelude module - commonly used types for convenient import.
//!
//! Use `use probe_core::prelude::*;` to import all essential types.

// Errors
pub use crate::{CoreError, CoreResult};

// Identity and naming
pub use crate::{ClassName, ProductInfo};

// Property sources
pub use crate::{MapProperties, PropertySource, SystemProperties};
