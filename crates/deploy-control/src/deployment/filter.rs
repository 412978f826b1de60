//! Allow-list filtering of plan entries.

use std::collections::HashSet;

use crate::plan::DeploymentPlan;

/// Decides which plan entries a run processes.
///
/// Without an allow-list every entry is eligible. With one, only listed names
/// are; the rest are neither deployed, hooked, nor reported.
#[derive(Debug, Clone, Default)]
pub struct DependencyFilter<'a> {
    allowed: Option<HashSet<&'a str>>,
}

impl<'a> DependencyFilter<'a> {
    /// Create a filter from an optional allow-list.
    #[must_use]
    pub fn new(dependencies: Option<&'a [String]>) -> Self {
        Self {
            allowed: dependencies.map(|names| names.iter().map(String::as_str).collect()),
        }
    }

    /// Whether the entry `name` is processed.
    #[must_use]
    pub fn allows(&self, name: &str) -> bool {
        self.allowed
            .as_ref()
            .map_or(true, |allowed| allowed.contains(name))
    }

    /// Allow-listed names that are not in `plan`, sorted.
    #[must_use]
    pub fn unmatched(&self, plan: &DeploymentPlan) -> Vec<&'a str> {
        let mut unmatched: Vec<_> = self
            .allowed
            .iter()
            .flatten()
            .copied()
            .filter(|name| !plan.contains(name))
            .collect();
        unmatched.sort_unstable();
        unmatched
    }
}
