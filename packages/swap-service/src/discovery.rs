//! Listing search: spatial, attribute, condition and free-text criteria composed into one query.

pub mod filter;
pub mod query;
pub mod text;

use std::{collections::BTreeMap, time::Duration};

use futures::future;
use serde::{Deserialize, Serialize};

use swap_domain::item::Item;

use crate::{
	AttachmentLimit, Result, SwapService, attachments,
	discovery::query::DiscoveryQuery,
};

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct SpatialQuery {
	pub latitude: f64,
	pub longitude: f64,
	/// Falls back to `discovery.default_radius` when absent.
	pub radius: Option<f64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DiscoveryRequest {
	pub location: Option<SpatialQuery>,
	/// Attribute field name to accepted values.
	#[serde(default)]
	pub attributes: BTreeMap<String, Vec<String>>,
	pub condition: Option<String>,
	pub search: Option<String>,
	pub limit: Option<i64>,
	pub skip: Option<i64>,
}

/// An item as returned to clients, with its inlined attachments.
#[derive(Clone, Debug, Serialize)]
pub struct ItemView {
	#[serde(flatten)]
	pub item: Item,
	pub attachments: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct DiscoveryResponse {
	pub items: Vec<ItemView>,
}

impl SwapService {
	pub async fn discover(&self, req: DiscoveryRequest) -> Result<DiscoveryResponse> {
		let query = DiscoveryQuery::compose(&req, &self.cfg.discovery)?;
		let candidates = self.store.scan_items(query.scan()).await?;
		let (page, impact) = query.apply(candidates);

		tracing::debug!(
			filters = ?impact.filters,
			candidate_count_pre = impact.candidate_count_pre,
			candidate_count_post = impact.candidate_count_post,
			dropped_total = impact.dropped_total,
			top_drop_reasons = ?impact.top_drop_reasons,
			limit = query.limit(),
			skip = query.skip(),
			"Discovery filter impact."
		);

		let limit = AttachmentLimit::AtMost(self.cfg.attachments.list_view_max as usize);
		let items = self.attach_all(page, limit).await?;

		Ok(DiscoveryResponse { items })
	}

	pub(crate) async fn attach_all(
		&self,
		items: Vec<Item>,
		limit: AttachmentLimit,
	) -> Result<Vec<ItemView>> {
		let timeout = self.fetch_timeout();
		let store = self.store.as_ref();
		let assembled = future::join_all(
			items.iter().map(|item| attachments::assemble(store, &item.id, limit, timeout)),
		)
		.await;
		let mut views = Vec::with_capacity(items.len());

		for (item, uris) in items.into_iter().zip(assembled) {
			views.push(ItemView { item, attachments: uris? });
		}

		Ok(views)
	}

	pub(crate) fn fetch_timeout(&self) -> Duration {
		Duration::from_millis(self.cfg.attachments.fetch_timeout_ms)
	}
}
