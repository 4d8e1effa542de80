// SPDX-License-Identifier: GPL-3.0

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use substrate_codec::NamingPolicy;
use url::Url;

/// Default RPC endpoint of a local node.
pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:9944";

/// Settings of a [`crate::SubstrateClient`].
///
/// Missing fields take their default value, so an empty document is a valid configuration:
///
/// ```toml
/// endpoint = "wss://rpc.polkadot.io"
/// naming-policy = "case-insensitive"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct ClientConfig {
	/// RPC endpoint of the node.
	pub endpoint: Url,
	/// Rule used to match module, call, constant and storage names.
	pub naming_policy: NamingPolicy,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			// The default endpoint is a valid URL.
			endpoint: Url::parse(DEFAULT_ENDPOINT).unwrap_or_else(|_| unreachable!()),
			naming_policy: NamingPolicy::default(),
		}
	}
}

impl ClientConfig {
	/// Parse a configuration from a TOML document.
	pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(content)?)
	}

	/// Load a configuration from the TOML file at `path`.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let content = std::fs::read_to_string(path)
			.map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
		let config = Self::from_toml_str(&content)?;
		log::debug!(target: "substrate_client", "loaded client config from {}", path.display());
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use anyhow::Result;
	use std::fs;
	use tempfile::tempdir;

	#[test]
	fn default_config() {
		let config = ClientConfig::default();
		assert_eq!(config.endpoint.as_str(), "ws://127.0.0.1:9944/");
		assert_eq!(config.naming_policy, NamingPolicy::Normalized);
	}

	#[test]
	fn empty_document_is_default() -> Result<()> {
		assert_eq!(ClientConfig::from_toml_str("")?, ClientConfig::default());
		Ok(())
	}

	#[test]
	fn parses_all_fields() -> Result<()> {
		let config = ClientConfig::from_toml_str(
			r#"
			endpoint = "wss://rpc.polkadot.io"
			naming-policy = "case-insensitive"
			"#,
		)?;
		assert_eq!(config.endpoint.host_str(), Some("rpc.polkadot.io"));
		assert_eq!(config.naming_policy, NamingPolicy::CaseInsensitive);
		Ok(())
	}

	#[test]
	fn rejects_invalid_documents() {
		assert!(matches!(ClientConfig::from_toml_str("endpoint = \"not a url\""), Err(ConfigError::Parse(_))));
		assert!(matches!(ClientConfig::from_toml_str("naming-policy = \"fuzzy\""), Err(ConfigError::Parse(_))));
		assert!(matches!(ClientConfig::from_toml_str("retries = 3"), Err(ConfigError::Parse(_))));
	}

	#[test]
	fn loads_from_file() -> Result<()> {
		let temp_dir = tempdir()?;
		let path = temp_dir.path().join("client.toml");
		fs::write(&path, "naming-policy = \"exact\"\n")?;
		let config = ClientConfig::load(&path)?;
		assert_eq!(config.naming_policy, NamingPolicy::Exact);
		assert_eq!(config.endpoint, ClientConfig::default().endpoint);

		let missing = ClientConfig::load(&temp_dir.path().join("missing.toml"));
		assert!(matches!(missing, Err(ConfigError::Read { .. })));
		Ok(())
	}
}
