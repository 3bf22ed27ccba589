//! Rule-set configuration: allowed enumerations, placement mapping, naming
//! template, and required frontmatter fields.
//!
//! The repository owns policy, the tool enforces it: everything here is
//! loaded from `ops/rules/kb.rules.yml`, never hard-coded in commands.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::KbError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Rules {
    #[serde(default)]
    pub kinds: Vec<String>,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub note_dirs: Vec<String>,
    #[serde(default)]
    pub frontmatter: FrontmatterRules,
    #[serde(default)]
    pub placement: PlacementRules,
    #[serde(default)]
    pub naming: NamingRules,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FrontmatterRules {
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub scope: ScopeRules,
    #[serde(default)]
    pub created_os: CreatedOsRules,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScopeRules {
    #[serde(default = "default_scope_allowed")]
    pub allowed: Vec<String>,
}

impl Default for ScopeRules {
    fn default() -> Self {
        Self {
            allowed: default_scope_allowed(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedOsRules {
    #[serde(default = "default_created_os_allowed")]
    pub allowed: Vec<String>,
}

impl Default for CreatedOsRules {
    fn default() -> Self {
        Self {
            allowed: default_created_os_allowed(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlacementRules {
    #[serde(default = "default_inbox_dir")]
    pub inbox_dir: String,
    #[serde(default = "default_patterns_dir")]
    pub patterns_dir: String,
    #[serde(default)]
    pub domain_dir_map: BTreeMap<String, String>,
}

impl Default for PlacementRules {
    fn default() -> Self {
        Self {
            inbox_dir: default_inbox_dir(),
            patterns_dir: default_patterns_dir(),
            domain_dir_map: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamingRules {
    #[serde(default = "default_file_template")]
    pub file_template: String,
}

impl Default for NamingRules {
    fn default() -> Self {
        Self {
            file_template: default_file_template(),
        }
    }
}

fn default_scope_allowed() -> Vec<String> {
    vec!["cross".to_string(), "os-specific".to_string()]
}

fn default_created_os_allowed() -> Vec<String> {
    vec![
        "macos".to_string(),
        "linux".to_string(),
        "windows".to_string(),
        "other".to_string(),
    ]
}

fn default_inbox_dir() -> String {
    "inbox".to_string()
}

fn default_patterns_dir() -> String {
    "patterns".to_string()
}

fn default_file_template() -> String {
    "{slug}--{id}.md".to_string()
}

impl Rules {
    /// Parse the rule set from YAML content. A non-mapping document or a
    /// mistyped field is fatal.
    pub fn from_yaml(content: &str) -> Result<Self, KbError> {
        serde_yaml::from_str(content)
            .map_err(|e| KbError::Rules(format!("invalid rules: kb.rules.yml: {e}")))
    }

    /// Allowed scope values, trimmed and lowercased. Empty after
    /// normalization is a configuration error.
    pub fn scope_values(&self) -> Result<Vec<String>, KbError> {
        normalized_values(&self.frontmatter.scope.allowed, "frontmatter.scope.allowed")
    }

    /// Allowed created_os values, trimmed and lowercased.
    pub fn created_os_values(&self) -> Result<Vec<String>, KbError> {
        normalized_values(
            &self.frontmatter.created_os.allowed,
            "frontmatter.created_os.allowed",
        )
    }

    /// The directory a `(kind, domain)` pair belongs in.
    ///
    /// Pattern notes collect in the patterns directory; inbox notes and
    /// cross-domain notes in the inbox; everything else maps through
    /// `placement.domain_dir_map`, defaulting to the domain name itself.
    pub fn placement_dir(&self, repo_root: &Path, kind: &str, domain: &str) -> PathBuf {
        if kind == "pattern" {
            return repo_root.join(&self.placement.patterns_dir);
        }
        if kind == "inbox" || domain == "cross" {
            return repo_root.join(&self.placement.inbox_dir);
        }
        let dir = self
            .placement
            .domain_dir_map
            .get(domain)
            .map(String::as_str)
            .unwrap_or(domain);
        repo_root.join(dir)
    }
}

fn normalized_values(raw: &[String], field: &str) -> Result<Vec<String>, KbError> {
    let values: Vec<String> = raw
        .iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect();
    if values.is_empty() {
        return Err(KbError::Rules(format!(
            "invalid rules: {field} must not be empty"
        )));
    }
    Ok(values)
}
