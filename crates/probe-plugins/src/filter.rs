//! Scope filter chains.
//!
//! A chain decides whether a plugin may act on a class. Every filter in the
//! chain must accept the dotted class name; evaluation stops at the first
//! rejection.

use std::fmt;
use std::sync::Arc;

use probe_core::namespace;

use crate::package::PackageList;

/// A predicate over a dotted class name.
pub type ClassNameFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Ordered conjunction of [`ClassNameFilter`]s.
///
/// An empty chain accepts every name.
#[derive(Clone, Default)]
pub struct ScopeFilterChain {
    filters: Vec<ClassNameFilter>,
}

impl ScopeFilterChain {
    /// Build a chain from filters, evaluated in the given order.
    #[must_use]
    pub fn new(filters: Vec<ClassNameFilter>) -> Self {
        Self { filters }
    }

    /// Append a filter.
    #[must_use]
    pub fn with(mut self, filter: ClassNameFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Whether every filter accepts `class_name`.
    #[must_use]
    pub fn is_scoped(&self, class_name: &str) -> bool {
        self.filters.iter().all(|filter| filter(class_name))
    }

    /// Number of filters in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Whether the chain has no filters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl fmt::Debug for ScopeFilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeFilterChain")
            .field("filters", &self.filters.len())
            .finish()
    }
}

/// Rejects the agent's own classes.
///
/// Any name starting with one of
/// [`RESERVED_PACKAGES`](probe_core::namespace::RESERVED_PACKAGES) is
/// refused.
#[must_use]
pub fn profiler_package_skip_filter() -> ClassNameFilter {
    Arc::new(|class_name: &str| !namespace::is_reserved(class_name))
}

/// Accepts names that start with one of the declared package prefixes.
///
/// Matching is a plain string prefix: `com.example` also admits
/// `com.examples.Other`.
#[must_use]
pub fn plugin_package_filter(packages: &PackageList) -> ClassNameFilter {
    let prefixes = packages.packages().to_vec();
    Arc::new(move |class_name: &str| {
        prefixes
            .iter()
            .any(|prefix| class_name.starts_with(prefix.as_str()))
    })
}
