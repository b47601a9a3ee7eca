//! Inlines stored attachments as `data:` URIs.

use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD};
use futures::future;

use swap_domain::attachment::Attachment;

use crate::{Result, Store};

/// How many of an owner's attachments to inline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachmentLimit {
	All,
	AtMost(usize),
}
impl AttachmentLimit {
	fn take(self, available: usize) -> usize {
		match self {
			Self::All => available,
			Self::AtMost(n) => n.min(available),
		}
	}
}

pub fn to_data_uri(attachment: &Attachment) -> String {
	format!("data:{};base64,{}", attachment.content_type, STANDARD.encode(&attachment.data))
}

/// Fetches the first `limit` attachments of `owner_id` concurrently and renders them as data
/// URIs in storage order.
///
/// Attachments that fail to load or exceed `timeout` are left out. Only a failure to list the
/// owner's attachments is an error.
pub async fn assemble(
	store: &dyn Store,
	owner_id: &str,
	limit: AttachmentLimit,
	timeout: Duration,
) -> Result<Vec<String>> {
	let refs = store.list_attachment_names(owner_id).await?;
	let wanted = limit.take(refs.len());

	if wanted == 0 {
		return Ok(Vec::new());
	}

	let fetches = refs[..wanted].iter().map(|attachment_ref| async move {
		let name = attachment_ref.name.as_str();

		match tokio::time::timeout(timeout, store.get_attachment(owner_id, name)).await {
			Ok(Ok(attachment)) => Some(to_data_uri(&attachment)),
			Ok(Err(err)) => {
				tracing::warn!(owner_id, attachment = name, error = %err, "Skipping unreadable attachment.");

				None
			},
			Err(_) => {
				tracing::warn!(
					owner_id,
					attachment = name,
					timeout_ms = timeout.as_millis() as u64,
					"Skipping attachment that timed out."
				);

				None
			},
		}
	});
	let uris: Vec<String> = future::join_all(fetches).await.into_iter().flatten().collect();

	tracing::debug!(owner_id, requested = wanted, inlined = uris.len(), "Assembled attachments.");

	Ok(uris)
}
