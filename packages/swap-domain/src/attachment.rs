use serde::{Deserialize, Serialize};

/// Identifies one binary payload stored alongside an item or user record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentRef {
	pub name: String,
	pub content_type: String,
	pub size: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
	pub name: String,
	pub content_type: String,
	pub data: Vec<u8>,
}

/// Content type for an upload, derived from its file extension. Only the image formats the
/// marketplace accepts are known.
pub fn content_type_for_extension(extension: &str) -> Option<&'static str> {
	match extension.to_ascii_lowercase().as_str() {
		"jpg" | "jpeg" => Some("image/jpeg"),
		"png" => Some("image/png"),
		_ => None,
	}
}

pub fn file_extension(file_name: &str) -> Option<&str> {
	let (stem, extension) = file_name.rsplit_once('.')?;

	if stem.is_empty() || extension.is_empty() { None } else { Some(extension) }
}
