//! Simulation configuration, validation, and error types.
//!
//! [`SimulationConfig`] is the input for
//! [`Simulation::new`](crate::Simulation::new).
//! [`validate()`](SimulationConfig::validate) checks it before any
//! thread is spawned.

use std::error::Error;
use std::fmt;

use gatesim_wire::{ResolveMode, ResolverChain, UnknownResolver};

/// Default bound on waves per pass.
pub const DEFAULT_MAX_ITERATIONS: usize = 1024;

// ── FailurePolicy ──────────────────────────────────────────────────

/// What a pass does when a gate update fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Record the failure and keep propagating through unaffected gates.
    #[default]
    Isolate,
    /// Stop after the wave containing the first failure.
    AbortPass,
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while building a [`Simulation`](crate::Simulation).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `max_iterations` is zero.
    InvalidMaxIterations,
    /// `event_workers` is zero.
    InvalidEventWorkers,
    /// A configured resolver name is not a built-in.
    UnknownResolver(UnknownResolver),
    /// A background thread could not be spawned.
    ThreadSpawnFailed {
        /// Description of which thread failed.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMaxIterations => write!(f, "max_iterations must be at least 1"),
            Self::InvalidEventWorkers => write!(f, "event_workers must be at least 1"),
            Self::UnknownResolver(e) => write!(f, "resolvers: {e}"),
            Self::ThreadSpawnFailed { reason } => write!(f, "thread spawn failed: {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UnknownResolver(e) => Some(e),
            _ => None,
        }
    }
}

impl From<UnknownResolver> for ConfigError {
    fn from(e: UnknownResolver) -> Self {
        Self::UnknownResolver(e)
    }
}

// ── SimulationConfig ───────────────────────────────────────────────

/// Construction parameters for a [`Simulation`](crate::Simulation).
#[derive(Clone, Debug)]
pub struct SimulationConfig {
    /// Built-in resolvers to register, in chain order. Default: none.
    pub resolvers: Vec<String>,
    /// Wire recomputation policy. Default: [`ResolveMode::Exact`].
    pub resolve_mode: ResolveMode,
    /// Maximum waves per pass before reporting non-convergence.
    /// Default: [`DEFAULT_MAX_ITERATIONS`].
    pub max_iterations: usize,
    /// Update worker threads. `None` = auto-detect
    /// (`available_parallelism / 2`, clamped to `[2, 16]`).
    /// `Some(0)` runs updates inline on the thread calling `step()`.
    pub worker_count: Option<usize>,
    /// Threads delivering event callbacks. Default: 2.
    pub event_workers: usize,
    /// Behavior on gate update failure. Default: [`FailurePolicy::Isolate`].
    pub failure_policy: FailurePolicy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            resolvers: Vec::new(),
            resolve_mode: ResolveMode::Exact,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            worker_count: None,
            event_workers: 2,
            failure_policy: FailurePolicy::Isolate,
        }
    }
}

impl SimulationConfig {
    /// Builder-style resolver list.
    pub fn with_resolvers<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        self.resolvers = names.iter().map(|n| n.as_ref().to_string()).collect();
        self
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::InvalidMaxIterations);
        }
        if self.event_workers == 0 {
            return Err(ConfigError::InvalidEventWorkers);
        }
        self.resolver_chain()?;
        Ok(())
    }

    /// Build the resolver chain named by [`resolvers`](Self::resolvers).
    pub fn resolver_chain(&self) -> Result<ResolverChain, ConfigError> {
        Ok(ResolverChain::with_builtins(&self.resolvers)?)
    }

    /// Resolve the actual worker count, applying auto-detection if `None`.
    ///
    /// Explicit values are clamped to `[0, 64]`; zero means inline.
    pub fn resolved_worker_count(&self) -> usize {
        match self.worker_count {
            Some(n) => n.min(64),
            None => {
                let cpus = std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(4);
                (cpus / 2).clamp(2, 16)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_iterations, 1024);
        assert_eq!(config.event_workers, 2);
        assert_eq!(config.failure_policy, FailurePolicy::Isolate);
        assert_eq!(config.resolve_mode, ResolveMode::Exact);
    }

    #[test]
    fn zero_max_iterations_rejected() {
        let config = SimulationConfig {
            max_iterations: 0,
            ..SimulationConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidMaxIterations));
    }

    #[test]
    fn zero_event_workers_rejected() {
        let config = SimulationConfig {
            event_workers: 0,
            ..SimulationConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidEventWorkers));
    }

    #[test]
    fn unknown_resolver_rejected_with_source() {
        let config = SimulationConfig::default().with_resolvers(&["identical", "bogus"]);
        let err = config.validate().unwrap_err();
        assert!(matches!(&err, ConfigError::UnknownResolver(e) if e.name == "bogus"));
        assert!(err.source().is_some());
    }

    #[test]
    fn resolver_chain_keeps_order() {
        let config = SimulationConfig::default().with_resolvers(&["wired_or", "identical"]);
        let chain = config.resolver_chain().unwrap();
        assert_eq!(chain.names().collect::<Vec<_>>(), vec!["wired_or", "identical"]);
    }

    #[test]
    fn worker_count_auto_is_clamped() {
        let n = SimulationConfig::default().resolved_worker_count();
        assert!((2..=16).contains(&n));
    }

    #[test]
    fn worker_count_explicit() {
        let inline = SimulationConfig {
            worker_count: Some(0),
            ..SimulationConfig::default()
        };
        assert_eq!(inline.resolved_worker_count(), 0);
        let big = SimulationConfig {
            worker_count: Some(500),
            ..SimulationConfig::default()
        };
        assert_eq!(big.resolved_worker_count(), 64);
    }
}
