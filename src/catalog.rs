// src/catalog.rs

//! Component catalog
//!
//! A TOML file declaring the components the orchestrator knows how to
//! install, plus optional conditional rules for the decision engine:
//!
//! ```toml
//! [[component]]
//! name = "postgres"
//! version = "16.2"
//! dependencies = []
//! install_method = "apt"
//! install_command = "apt-get install -y postgresql-16"
//!
//! [component.detect]
//! executable = "psql"
//!
//! [[rule]]
//! alternatives = ["podman"]
//! targets = ["docker"]
//! ```

use crate::component::{ComponentDescriptor, ConfigProvider};
use crate::decision::ConditionalRule;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// On-disk catalog layout
#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "component")]
    components: Vec<ComponentDescriptor>,
    #[serde(default, rename = "rule")]
    rules: Vec<ConditionalRule>,
}

/// In-memory catalog; the standard `ConfigProvider` implementation
#[derive(Debug)]
pub struct Catalog {
    components: HashMap<String, Arc<ComponentDescriptor>>,
    /// Declaration order, for stable listings
    names: Vec<String>,
    rules: Vec<ConditionalRule>,
}

impl Catalog {
    /// Load and validate a catalog file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: CatalogFile = toml::from_str(&content)?;
        debug!(
            "loaded catalog from {} ({} components, {} rules)",
            path.display(),
            file.components.len(),
            file.rules.len()
        );
        Self::from_parts(file.components, file.rules)
    }

    /// Build a catalog directly from descriptors (tests, embedded use)
    pub fn from_descriptors(descriptors: Vec<ComponentDescriptor>) -> Result<Self> {
        Self::from_parts(descriptors, Vec::new())
    }

    fn from_parts(
        descriptors: Vec<ComponentDescriptor>,
        rules: Vec<ConditionalRule>,
    ) -> Result<Self> {
        let mut components = HashMap::new();
        let mut names = Vec::new();
        for descriptor in descriptors {
            if descriptor.name.is_empty() {
                return Err(Error::Catalog("component with empty name".to_string()));
            }
            let name = descriptor.name.clone();
            if components.insert(name.clone(), Arc::new(descriptor)).is_some() {
                return Err(Error::Catalog(format!(
                    "duplicate component '{name}' in catalog"
                )));
            }
            names.push(name);
        }
        Ok(Self {
            components,
            names,
            rules,
        })
    }

    /// Component names in declaration order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Conditional rules declared alongside the components
    pub fn rules(&self) -> &[ConditionalRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl ConfigProvider for Catalog {
    fn load(&self, name: &str) -> Result<Arc<ComponentDescriptor>> {
        self.components
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownComponent(name.to_string()))
    }
}
