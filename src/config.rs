//! Conversion configuration.
//!
//! Everything the converter needs to know besides the two directory paths
//! lives in [`ConvertConfig`]: the placeholder tokens, the name of the
//! environment variable holding the host address, how sibling data files are
//! treated, and the rendering options. The value is built once at startup and
//! only ever borrowed afterwards.
//!
//! ## Config File
//!
//! A config file is optional (`--config <FILE>`). It is sparse: override only
//! what you need. All options with their defaults:
//!
//! ```toml
//! index_placeholder = "DIRECTORY_INDEX"   # Replaced with the directory index
//! address_placeholder = "LOCAL_IP_ADDRESS" # Replaced with $ipAddress
//! address_env = "ipAddress"               # Variable read for the host address
//! index_name = "index"                    # Base name never listed in an index
//! data_files = "copy"                     # copy | index | index-and-copy | wrap
//!
//! [render]
//! unsafe_html = true    # Pass embedded raw HTML through untouched
//! heading_ids = true    # Generate id attributes for headings
//! autolinks = true      # Turn bare URLs into links
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// How `.yaml` files found next to markup files are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DataFilePolicy {
    /// Copy unchanged like any other asset; not listed in the index.
    #[default]
    Copy,
    /// List in the directory index; not copied.
    Index,
    /// List in the directory index and copy unchanged.
    IndexAndCopy,
    /// List in the directory index and write a `<pre>` HTML wrapper.
    Wrap,
}

impl DataFilePolicy {
    /// Whether data files take part in the directory index.
    pub fn indexes(self) -> bool {
        !matches!(self, DataFilePolicy::Copy)
    }

    /// Whether data files are byte-copied to the destination.
    pub fn copies(self) -> bool {
        matches!(self, DataFilePolicy::Copy | DataFilePolicy::IndexAndCopy)
    }
}

/// Conversion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertConfig {
    /// Token replaced with the generated directory index.
    pub index_placeholder: String,
    /// Token replaced with the host address.
    pub address_placeholder: String,
    /// Environment variable holding the host address.
    pub address_env: String,
    /// Base name (case-insensitive) excluded from directory indexes.
    pub index_name: String,
    /// Treatment of sibling `.yaml` files.
    pub data_files: DataFilePolicy,
    /// Markdown rendering options.
    pub render: RenderOptions,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            index_placeholder: "DIRECTORY_INDEX".to_string(),
            address_placeholder: "LOCAL_IP_ADDRESS".to_string(),
            address_env: "ipAddress".to_string(),
            index_name: "index".to_string(),
            data_files: DataFilePolicy::default(),
            render: RenderOptions::default(),
        }
    }
}

impl ConvertConfig {
    /// Validate that the placeholder tokens can be substituted unambiguously.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.index_placeholder.is_empty() {
            return Err(ConfigError::Validation(
                "index_placeholder must not be empty".into(),
            ));
        }
        if self.address_placeholder.is_empty() {
            return Err(ConfigError::Validation(
                "address_placeholder must not be empty".into(),
            ));
        }
        if self.index_placeholder == self.address_placeholder {
            return Err(ConfigError::Validation(
                "index_placeholder and address_placeholder must differ".into(),
            ));
        }
        if self.index_placeholder == ".md)" || self.address_placeholder == ".md)" {
            return Err(ConfigError::Validation(
                "placeholders must not collide with the `.md)` link rewrite".into(),
            ));
        }
        if self.address_env.is_empty() || self.address_env.contains('=') {
            return Err(ConfigError::Validation(
                "address_env must be a valid environment variable name".into(),
            ));
        }
        if self.index_name.is_empty() {
            return Err(ConfigError::Validation("index_name must not be empty".into()));
        }
        Ok(())
    }

    /// Current value of the host-address variable, as raw bytes; empty when
    /// unset. A value that is not valid UTF-8 is kept as-is.
    ///
    /// Read once at startup, before traversal begins.
    pub fn host_address(&self) -> Vec<u8> {
        std::env::var_os(&self.address_env)
            .map(OsString::into_encoded_bytes)
            .unwrap_or_default()
    }
}

/// Markdown rendering options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderOptions {
    /// Pass raw HTML blocks and inline tags through unsanitized.
    pub unsafe_html: bool,
    /// Give every heading an `id` derived from its text.
    pub heading_ids: bool,
    /// Link bare `http://`, `https://` and `www.` URLs.
    pub autolinks: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            unsafe_html: true,
            heading_ids: true,
            autolinks: true,
        }
    }
}

/// Load and validate a config file.
pub fn load_config(path: &Path) -> Result<ConvertConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ConvertConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// The default configuration rendered as TOML.
pub fn stock_config_toml() -> String {
    // Serializing plain strings, bools and unit enums cannot fail.
    toml::to_string_pretty(&ConvertConfig::default()).unwrap_or_default()
}
