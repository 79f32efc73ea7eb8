//! Step configuration
//!
//! A step is described by a flat TOML document: key field names, planner and
//! sink selection by type name with component-specific options, and batch
//! lifecycle flags. Parsing and validation happen before the engine is
//! constructed; component options are resolved through the registry exactly
//! once at step construction.

use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};

/// Configuration for one named pipeline step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    /// Step name, used in logs and error messages
    pub name: String,

    /// Key field names for key-scoped planning
    #[serde(default)]
    pub key_fields: Vec<String>,

    /// Cache the arriving batch for reuse within the cycle
    #[serde(default = "default_cache")]
    pub cache: bool,

    /// Hint that the batch is small enough to broadcast
    #[serde(default)]
    pub hint_small: bool,

    /// Number of concurrent processing units for the key-scoped path
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,

    /// Planner selection; a step without one performs no write
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planner: Option<ComponentConfig>,

    /// Sink selection; required whenever a planner is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sink: Option<ComponentConfig>,
}

/// Selection of a registered component by type name, with its options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentConfig {
    /// Registered type name, e.g. "upsert" or "memory"
    #[serde(rename = "type")]
    pub kind: String,

    /// Component-specific options, passed through to the constructor
    #[serde(flatten)]
    pub options: toml::Table,
}

fn default_cache() -> bool {
    true
}

fn default_parallelism() -> usize {
    4
}

impl StepConfig {
    /// Parse a step configuration from a TOML document
    pub fn from_toml_str(contents: &str) -> PipelineResult<Self> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| PipelineError::config(format!("failed to parse step config: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate structural requirements that do not need the registry
    pub fn validate(&self) -> PipelineResult<()> {
        if self.name.is_empty() {
            return Err(PipelineError::config("step name cannot be empty"));
        }

        if self.planner.is_some() != self.sink.is_some() {
            return Err(PipelineError::config(format!(
                "step '{}' must configure both a planner and a sink, or neither",
                self.name
            )));
        }

        if self.parallelism == 0 {
            return Err(PipelineError::config(format!(
                "step '{}' parallelism must be at least 1",
                self.name
            )));
        }

        Ok(())
    }

    /// Whether this step writes to a sink
    pub fn has_write(&self) -> bool {
        self.planner.is_some()
    }
}
