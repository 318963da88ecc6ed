//! Epoch configuration.
//!
//! [`EpochConfig`] picks the selection strategy and bounds dependency
//! exploration. It can be built programmatically or loaded with
//! [`EpochConfig::load`], which layers defaults, an optional file and
//! `SCRIP_*` environment variables, in that order.

use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_DEPENDENCY_DEPTH, ENV_PREFIX};
use crate::dependency_chain::DependencyChainStrategy;
use crate::error::ConfigError;
use crate::fee_maximizing::FeeMaximizingStrategy;
use crate::traits::SelectionStrategy;

/// Which selector an epoch runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    DependencyChain,
    FeeMaximizing,
}

impl StrategyKind {
    /// Build the strategy. `max_depth` only affects the dependency-chain selector.
    pub fn build(self, max_depth: usize) -> Box<dyn SelectionStrategy> {
        match self {
            StrategyKind::DependencyChain => Box::new(DependencyChainStrategy::new(max_depth)),
            StrategyKind::FeeMaximizing => Box::new(FeeMaximizingStrategy),
        }
    }
}

/// Configuration for an [`EpochHandler`](crate::handler::EpochHandler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpochConfig {
    /// Selection strategy run by each epoch.
    pub strategy: StrategyKind,
    /// How many in-batch producers one exploration may descend through.
    pub max_dependency_depth: usize,
}

impl Default for EpochConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            max_dependency_depth: DEFAULT_MAX_DEPENDENCY_DEPTH,
        }
    }
}

impl EpochConfig {
    /// Load from an optional file and the environment.
    ///
    /// The file format is taken from its extension. Environment variables use
    /// the `SCRIP_` prefix, e.g. `SCRIP_STRATEGY=fee_maximizing`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let cfg: EpochConfig = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_dependency_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "max_dependency_depth",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn build_strategy(&self) -> Box<dyn SelectionStrategy> {
        self.strategy.build(self.max_dependency_depth)
    }
}
