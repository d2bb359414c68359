//! Per-dependency failure policy
//!
//! The generator talks to four external services. Whether a failure of one of
//! them aborts the invocation or is absorbed with a fallback value is looked up
//! here instead of being encoded in the shape of the orchestration code.

use std::collections::HashMap;
use std::fmt;

use crate::errors::HandlerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dependency {
    ObjectStore,
    Inference,
    Retrieval,
    Publish,
}

impl Dependency {
    /// Whether a failed call has a value the pipeline can continue with.
    /// Only retrieval does: without definitions the prompt still works, while
    /// there is no substitute for the diagram, the generated code or the commit.
    pub fn has_fallback(&self) -> bool {
        matches!(self, Dependency::Retrieval)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dependency::ObjectStore => "object store",
            Dependency::Inference => "inference",
            Dependency::Retrieval => "retrieval",
            Dependency::Publish => "publish",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Failure aborts the pipeline.
    Required,
    /// Failure is logged and replaced by the fallback value.
    BestEffort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyTable {
    policies: HashMap<Dependency, FailurePolicy>,
}

impl Default for PolicyTable {
    fn default() -> Self {
        let policies = HashMap::from([
            (Dependency::ObjectStore, FailurePolicy::Required),
            (Dependency::Inference, FailurePolicy::Required),
            (Dependency::Retrieval, FailurePolicy::BestEffort),
            (Dependency::Publish, FailurePolicy::Required),
        ]);
        Self { policies }
    }
}

impl PolicyTable {
    /// Override one entry. `BestEffort` is rejected for dependencies without
    /// a fallback value.
    pub fn with_policy(
        mut self,
        dependency: Dependency,
        policy: FailurePolicy,
    ) -> Result<Self, HandlerError> {
        if policy == FailurePolicy::BestEffort && !dependency.has_fallback() {
            return Err(HandlerError::config(format!(
                "{} has no fallback value and cannot be best effort",
                dependency
            )));
        }
        self.policies.insert(dependency, policy);
        Ok(self)
    }

    /// Unlisted dependencies are required.
    pub fn policy(&self, dependency: Dependency) -> FailurePolicy {
        self.policies
            .get(&dependency)
            .copied()
            .unwrap_or(FailurePolicy::Required)
    }

    /// Outcome of a call to a dependency that has no fallback value. The table
    /// only ever holds `Required` for these, so failures always propagate.
    pub fn require<T>(
        &self,
        dependency: Dependency,
        result: Result<T, HandlerError>,
    ) -> Result<T, HandlerError> {
        debug_assert_eq!(self.policy(dependency), FailurePolicy::Required);
        result.map_err(|err| {
            log::error!("{} call failed: {}", dependency, err);
            err
        })
    }

    /// Apply the dependency's policy to the outcome of a call to it.
    pub fn resolve<T>(
        &self,
        dependency: Dependency,
        result: Result<T, HandlerError>,
        fallback: impl FnOnce() -> T,
    ) -> Result<T, HandlerError> {
        match result {
            Ok(value) => Ok(value),
            Err(err) => match self.policy(dependency) {
                FailurePolicy::Required => {
                    log::error!("{} call failed: {}", dependency, err);
                    Err(err)
                }
                FailurePolicy::BestEffort => {
                    log::warn!("{} call failed, continuing without it: {}", dependency, err);
                    Ok(fallback())
                }
            },
        }
    }
}
