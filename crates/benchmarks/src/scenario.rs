//! Scenario registry.
//!
//! A [`Scenario`] is one logical query expressed once per competing tool.
//! The [`ScenarioRegistry`] keeps scenarios in registration order and each
//! scenario keeps its variants in declaration order; the runner reports in
//! exactly that order so repeated runs diff cleanly.
//!
//! Registries come from [`ScenarioRegistry::builtin`] or from a TOML file:
//!
//! ```toml
//! [[scenario]]
//! name = "count all files"
//!
//! [[scenario.variant]]
//! tool = "rg"
//! command = "rg --files -uu -a"
//! ```
//!
//! Command strings are opaque shell text and are never inspected.

use crate::error::{PerfError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// One tool's realization of a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    /// Short tool identifier, also the capture file stem.
    pub tool: String,
    /// Shell command performing the scenario's query.
    pub command: String,
}

impl Variant {
    /// Create a new variant.
    pub fn new(tool: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            command: command.into(),
        }
    }
}

/// A named benchmark query with one variant per tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    name: String,
    #[serde(rename = "variant", default)]
    variants: Vec<Variant>,
}

impl Scenario {
    /// Create a scenario with no variants.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variants: Vec::new(),
        }
    }

    /// Append a variant, keeping declaration order.
    pub fn variant(mut self, tool: impl Into<String>, command: impl Into<String>) -> Self {
        self.variants.push(Variant::new(tool, command));
        self
    }

    /// Report heading for this scenario.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Variants in declaration order.
    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(PerfError::InvalidRegistry(
                "scenario name must not be empty".to_string(),
            ));
        }
        if self.variants.is_empty() {
            return Err(PerfError::InvalidRegistry(format!(
                "scenario `{}` has no variants",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for variant in &self.variants {
            if !is_valid_tool_id(&variant.tool) {
                return Err(PerfError::InvalidRegistry(format!(
                    "scenario `{}`: invalid tool id `{}` (allowed: A-Z a-z 0-9 _ . -)",
                    self.name, variant.tool
                )));
            }
            if !seen.insert(variant.tool.as_str()) {
                return Err(PerfError::InvalidRegistry(format!(
                    "scenario `{}`: tool `{}` declared twice",
                    self.name, variant.tool
                )));
            }
        }
        Ok(())
    }
}

/// Tool ids name capture files, so they stay within a filename-safe set.
fn is_valid_tool_id(tool: &str) -> bool {
    !tool.is_empty()
        && tool != "."
        && tool != ".."
        && tool
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

#[derive(Debug, Deserialize)]
struct ScenarioFile {
    #[serde(rename = "scenario", default)]
    scenarios: Vec<Scenario>,
}

/// Ordered collection of scenarios for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioRegistry {
    scenarios: Vec<Scenario>,
}

impl ScenarioRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The default comparison of `mo` against `rg` and `ag`.
    pub fn builtin() -> Self {
        let scenarios = vec![
            Scenario::new("count all files")
                .variant("mo", "mo -l -u -U -a")
                .variant("rg", "rg --files -uu -a")
                .variant("ag", "ag -l -uu -a"),
            Scenario::new(
                "search for `test` in .cpp files in subfolder `core` where path contains /auro/",
            )
            .variant("mo", "mo -C core -e cpp -f /auro/ -w -p test -l")
            .variant(
                "rg",
                r"rg -t cpp --files core | rg /auro/ | rg '.cpp$' | tr '\n' '\0' | xargs -0 rg -i -w test -l",
            )
            .variant(
                "ag",
                r"ag --cpp -l . core | ag /auro/ | ag '.cpp$' | tr '\n' '\0' | xargs -0 ag -w test -l",
            ),
        ];
        Self { scenarios }
    }

    /// Parse a registry from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: ScenarioFile = toml::from_str(text)?;
        let mut registry = Self::new();
        for scenario in file.scenarios {
            registry.push(scenario)?;
        }
        Ok(registry)
    }

    /// Load a registry from a TOML scenario file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| PerfError::ScenarioFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Register a scenario at the end of the run order.
    pub fn push(&mut self, scenario: Scenario) -> Result<()> {
        scenario.validate()?;
        if self.scenarios.iter().any(|s| s.name == scenario.name) {
            return Err(PerfError::InvalidRegistry(format!(
                "scenario `{}` registered twice",
                scenario.name
            )));
        }
        self.scenarios.push(scenario);
        Ok(())
    }

    /// Scenarios in registration order.
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Iterate scenarios in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Scenario> {
        self.scenarios.iter()
    }

    /// Number of scenarios.
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Whether no scenario is registered.
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Total number of (scenario, tool) pairs.
    pub fn variant_count(&self) -> usize {
        self.scenarios.iter().map(|s| s.variants.len()).sum()
    }
}

impl<'a> IntoIterator for &'a ScenarioRegistry {
    type Item = &'a Scenario;
    type IntoIter = std::slice::Iter<'a, Scenario>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
