mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Attachments, Config, Discovery, DiscoveryText, DistanceUnit, Postgres, Security, Service,
	Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.discovery.max_limit == 0 {
		return Err(Error::Validation {
			message: "discovery.max_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.discovery.default_limit == 0 {
		return Err(Error::Validation {
			message: "discovery.default_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.discovery.default_limit > cfg.discovery.max_limit {
		return Err(Error::Validation {
			message: "discovery.default_limit must not exceed discovery.max_limit.".to_string(),
		});
	}
	if !cfg.discovery.default_radius.is_finite() {
		return Err(Error::Validation {
			message: "discovery.default_radius must be a finite number.".to_string(),
		});
	}
	if cfg.discovery.default_radius < 0.0 {
		return Err(Error::Validation {
			message: "discovery.default_radius must be zero or greater.".to_string(),
		});
	}

	let min_similarity = cfg.discovery.text.min_similarity;

	if !min_similarity.is_finite() {
		return Err(Error::Validation {
			message: "discovery.text.min_similarity must be a finite number.".to_string(),
		});
	}
	if !(0.0..=2.0).contains(&min_similarity) {
		return Err(Error::Validation {
			message: "discovery.text.min_similarity must be in the range 0.0-2.0.".to_string(),
		});
	}
	if cfg.attachments.list_view_max == 0 {
		return Err(Error::Validation {
			message: "attachments.list_view_max must be greater than zero.".to_string(),
		});
	}
	if cfg.attachments.fetch_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "attachments.fetch_timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.attachments.max_upload_bytes == 0 {
		return Err(Error::Validation {
			message: "attachments.max_upload_bytes must be greater than zero.".to_string(),
		});
	}
	if cfg.attachments.allowed_extensions.is_empty() {
		return Err(Error::Validation {
			message: "attachments.allowed_extensions must be non-empty.".to_string(),
		});
	}
	if cfg.security.user_header.trim().is_empty() {
		return Err(Error::Validation {
			message: "security.user_header must be non-empty.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.security.api_auth_token.as_deref().map(|token| token.trim().is_empty()).unwrap_or(false)
	{
		cfg.security.api_auth_token = None;
	}

	cfg.security.user_header = cfg.security.user_header.trim().to_ascii_lowercase();
	cfg.attachments.allowed_extensions = cfg
		.attachments
		.allowed_extensions
		.iter()
		.map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
		.filter(|ext| !ext.is_empty())
		.collect();
}
