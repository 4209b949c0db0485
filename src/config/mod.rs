//! Configuration loading and management

use crate::core::error::ConfigError;
use crate::core::metadata::{Column, FactoryOption};
use crate::core::options::CrudOptions;
use crate::core::validation::ValidationRuleSet;
use crate::server::resource::{Resource, ResourceBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Declaration of one resource
///
/// ```yaml
/// entity: comment
/// path: /comments
/// columns:
///   - { name: id, type: integer, isPrimary: true }
///   - { name: body, type: string }
/// relations: [writer]
/// routes:
///   readOne: { relations: false }
/// exclude: [recover]
/// rules:
///   body:
///     rules:
///       - { rule: required, groups: [create, upsert] }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceConfig {
    /// Entity name, route options and method selection
    #[serde(flatten)]
    pub options: CrudOptions,

    /// Mount path, defaults to `/{entity}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    pub columns: Vec<Column>,

    /// Relation names declared by the entity
    #[serde(default)]
    pub relations: Vec<String>,

    #[serde(default)]
    pub rules: ValidationRuleSet,
}

impl ResourceConfig {
    /// Column metadata, primary keys derived from `isPrimary`
    pub fn factory_option(&self) -> FactoryOption {
        FactoryOption::from_columns(self.columns.clone()).with_relations(self.relations.clone())
    }

    /// Mount path of the resource
    pub fn prefix(&self) -> String {
        self.path
            .clone()
            .unwrap_or_else(|| format!("/{}", self.options.entity))
    }

    /// A resource builder preloaded with this declaration
    pub fn builder(&self) -> ResourceBuilder {
        Resource::builder(self.factory_option())
            .options(self.options.clone())
            .rules(self.rules.clone())
    }
}

/// Complete configuration: a list of resources
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourcesConfig {
    pub resources: Vec<ResourceConfig>,
}

impl ResourcesConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Find a resource by entity name
    pub fn resource(&self, entity: &str) -> Option<&ResourceConfig> {
        self.resources
            .iter()
            .find(|resource| resource.options.entity == entity)
    }

    /// Build every declared resource
    pub fn build_resources(&self) -> Result<Vec<(String, Resource)>, ConfigError> {
        self.resources
            .iter()
            .map(|config| Ok((config.prefix(), config.builder().build()?)))
            .collect()
    }
}
