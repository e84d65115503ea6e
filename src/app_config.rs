use anyhow::{anyhow, Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::notation::EncodePolicy;
use crate::reader::{DEFAULT_TAG_COLOR, DEFAULT_TAG_STYLE};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Config {
    /// Span heuristics used when encoding cell runs into tagged text
    #[serde(default)]
    pub encoding: EncodePolicy,

    /// Write-back settings
    #[serde(default)]
    pub writer: WriterConfig,

    /// Track-changes extraction settings
    #[serde(default)]
    pub track_changes: TrackChangesConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// What the writer does for tag spans when the "Tag" style is absent
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StyleFallback {
    // @fallback: italic + fallback color
    #[default]
    Manual,
    // @fallback: unformatted text
    Plain,
}

/// Writer configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WriterConfig {
    // @field: Character style applied to numbered-pair tag spans
    #[serde(default = "default_tag_style_name")]
    pub tag_style_name: String,

    // @field: Formatting used when the tag style is missing
    #[serde(default)]
    pub style_fallback: StyleFallback,

    // @field: RRGGBB color of manual tag formatting
    #[serde(default = "default_fallback_color")]
    pub fallback_color: String,

    // @field: Normalize XML prologs of numbered-pair documents
    #[serde(default = "default_true")]
    pub fix_xml_prologs: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            tag_style_name: default_tag_style_name(),
            style_fallback: StyleFallback::default(),
            fallback_color: default_fallback_color(),
            fix_xml_prologs: true,
        }
    }
}

/// Track-changes configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct TrackChangesConfig {
    // @field: Also scan headers, footers, notes and comments
    #[serde(default)]
    pub include_auxiliary_parts: bool,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_tag_style_name() -> String {
    DEFAULT_TAG_STYLE.to_string()
}

fn default_fallback_color() -> String {
    DEFAULT_TAG_COLOR.to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let threshold = self.encoding.formatted_share_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(anyhow!(
                "encoding.formatted_share_threshold must be in (0, 1], got {}",
                threshold
            ));
        }

        if self.writer.tag_style_name.trim().is_empty() {
            return Err(anyhow!("writer.tag_style_name must not be empty"));
        }

        let color = &self.writer.fallback_color;
        if color.len() != 6 || !color.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(anyhow!(
                "writer.fallback_color must be six hex digits (RRGGBB), got '{}'",
                color
            ));
        }

        Ok(())
    }

    /// Load the configuration file, writing a default one when it is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            let config = Config::default();
            let json = serde_json::to_string_pretty(&config)?;
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write default config file: {}", path.display()))?;
            info!("Created default configuration at {}", path.display());
            return Ok(config);
        }

        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }
}
