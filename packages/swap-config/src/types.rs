use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub discovery: Discovery,
	pub attachments: Attachments,
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Discovery {
	/// Result cap applied when a request does not name one.
	pub default_limit: u32,
	/// Hard ceiling for client supplied limits.
	pub max_limit: u32,
	/// Radius applied when a request does not name one, in `distance_unit`.
	pub default_radius: f64,
	#[serde(default)]
	pub distance_unit: DistanceUnit,
	pub text: DiscoveryText,
}

#[derive(Debug, Deserialize)]
pub struct DiscoveryText {
	/// Normalized similarity in the range 0.0-1.0, or a whole number of edits when 1.0 or
	/// greater.
	pub min_similarity: f32,
	/// Reproduces the historical trailing-space search behavior, which disables fuzzy edits.
	#[serde(default)]
	pub preserve_trailing_space_quirk: bool,
	#[serde(default = "default_true")]
	pub include_description: bool,
	#[serde(default = "default_true")]
	pub include_tags: bool,
}

#[derive(Debug, Deserialize)]
pub struct Attachments {
	pub list_view_max: u32,
	pub fetch_timeout_ms: u64,
	pub max_upload_bytes: u64,
	pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Security {
	pub bind_localhost_only: bool,
	pub api_auth_token: Option<String>,
	#[serde(default = "default_user_header")]
	pub user_header: String,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
	#[default]
	Miles,
	Kilometers,
}
impl DistanceUnit {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Miles => "miles",
			Self::Kilometers => "kilometers",
		}
	}
}

fn default_true() -> bool {
	true
}

fn default_user_header() -> String {
	"x-user-id".to_string()
}
