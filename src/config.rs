//! Runtime configuration: where the export lives, how to parse it, and
//! which columns play which role.
//!
//! Values come from three layers, later ones winning: built-in defaults for
//! the lens catalogue, an optional YAML file, then command-line flags.

use std::{fs, path::Path};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::{cli::SourceArgs, parser::ParsePolicy};

pub const DEFAULT_SOURCE_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vR0tcO4_TBJ6FNjiDuTEYUY3-lFN_kzJNq99_TStSqvU3jO4bmPBKYug0ggX9yB9qpjoB3U8N-KKqlp/pub?gid=467961282&single=true&output=csv";

/// Columns the filtering, sorting and comparison logic refers to by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignatedFields {
    /// Mount / category column offered as an exact-match filter.
    pub category: String,
    /// Focal length / size column, filtered and sorted numerically.
    pub size: String,
    /// Identifies a record for comparison selection.
    pub key: String,
    pub maker: String,
    pub image: String,
}

impl Default for DesignatedFields {
    fn default() -> Self {
        Self {
            category: "マウント".to_string(),
            size: "焦点距離".to_string(),
            key: "レンズ名".to_string(),
            maker: "メーカー".to_string(),
            image: "画像URL".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source_url: String,
    pub policy: ParsePolicy,
    pub fields: DesignatedFields,
    /// Attribute rows of the comparison grid, top to bottom.
    pub compare_rows: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            policy: ParsePolicy::default(),
            fields: DesignatedFields::default(),
            compare_rows: [
                "メーカー",
                "マウント",
                "焦点距離",
                "開放F値",
                "最短撮影距離",
                "最大撮影倍率",
                "フィルター径",
                "質量",
                "レンズ構成",
                "絞り羽根枚数",
                "価格(参考)",
                "発売日",
                "特徴・説明",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Opening config file {path:?}"))?;
        let config: Config = serde_yaml::from_str(&raw)
            .with_context(|| format!("Parsing config YAML {path:?}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = serde_yaml::to_string(self).context("Serializing config YAML")?;
        fs::write(path, serialized).with_context(|| format!("Writing config file {path:?}"))
    }

    /// Defaults, then `--config`, then individual flags.
    pub fn resolve(args: &SourceArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(url) = &args.url {
            config.source_url = url.clone();
        }
        if let Some(policy) = args.policy {
            config.policy = policy;
        }
        if let Some(key) = &args.key_field {
            config.fields.key = key.clone();
        }
        if let Some(category) = &args.category_field {
            config.fields.category = category.clone();
        }
        if let Some(size) = &args.size_field {
            config.fields.size = size.clone();
        }
        let rows = args
            .rows
            .iter()
            .flat_map(|s| s.split(','))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect::<Vec<_>>();
        if !rows.is_empty() {
            config.compare_rows = rows;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let fields = &self.fields;
        for (role, name) in [
            ("category", &fields.category),
            ("size", &fields.size),
            ("key", &fields.key),
        ] {
            if name.trim().is_empty() {
                return Err(anyhow!("Designated {role} field name cannot be empty"));
            }
        }
        Ok(())
    }

    /// Fields offered as filter controls, in display order.
    pub fn filter_fields(&self) -> Vec<String> {
        vec![self.fields.category.clone(), self.fields.size.clone()]
    }
}
