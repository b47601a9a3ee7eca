use std::{cmp::Ordering, collections::HashMap};

use serde::Serialize;

use swap_config::Discovery;
use swap_domain::item::{Item, ItemStatus, Location};

use crate::{
	Error, ItemScan, Result,
	discovery::{
		DiscoveryRequest,
		filter::{AttributeFacetFilter, ConditionFilter, ItemPredicate, SpatialFilter},
		text::{self, FuzzyTextMatcher},
	},
};

const MAX_DROP_REASONS: usize = 5;

/// A discovery request resolved against configuration: the storage prefilter, the in-process
/// conjunction, and the page window.
pub struct DiscoveryQuery {
	scan: ItemScan,
	predicates: Vec<Box<dyn ItemPredicate>>,
	text: Option<FuzzyTextMatcher>,
	limit: usize,
	skip: usize,
}
impl DiscoveryQuery {
	pub fn compose(req: &DiscoveryRequest, cfg: &Discovery) -> Result<Self> {
		let limit = resolve_limit(req.limit, cfg)?;
		let skip = resolve_skip(req.skip)?;
		let mut scan = ItemScan {
			status: Some(ItemStatus::Available),
			..Default::default()
		};
		let mut predicates: Vec<Box<dyn ItemPredicate>> = Vec::new();

		if let Some(spatial) = &req.location {
			let filter = SpatialFilter::new(
				Location { latitude: spatial.latitude, longitude: spatial.longitude },
				spatial.radius.unwrap_or(cfg.default_radius),
				cfg.distance_unit,
			)?;

			scan.bounds = filter.bounds();

			predicates.push(Box::new(filter));
		}

		let facets = AttributeFacetFilter::new(&req.attributes);

		if !facets.is_empty() {
			predicates.push(Box::new(facets));
		}
		if let Some(condition) = ConditionFilter::new(req.condition.as_deref()) {
			predicates.push(Box::new(condition));
		}

		let text = req.search.as_deref().and_then(|phrase| FuzzyTextMatcher::new(phrase, &cfg.text));

		Ok(Self { scan, predicates, text, limit, skip })
	}

	pub fn scan(&self) -> ItemScan {
		self.scan
	}

	pub fn limit(&self) -> usize {
		self.limit
	}

	pub fn skip(&self) -> usize {
		self.skip
	}

	/// Keeps candidates that satisfy every predicate, orders them, and cuts the requested page.
	///
	/// Candidates arrive in storage order. A text search reorders by relevance, ties by id.
	pub fn apply(&self, candidates: Vec<Item>) -> (Vec<Item>, FilterImpact) {
		let pre = candidates.len();
		let mut reasons: HashMap<String, usize> = HashMap::new();
		let mut kept: Vec<(Item, f32)> = Vec::with_capacity(candidates.len());

		'candidates: for item in candidates {
			for predicate in &self.predicates {
				let (keep, reason) = predicate.evaluate(&item);

				if !keep {
					*reasons
						.entry(reason.unwrap_or_else(|| format!("{}.no_match", predicate.name())))
						.or_insert(0) += 1;

					continue 'candidates;
				}
			}

			let score = match &self.text {
				Some(matcher) => match matcher.score(&item) {
					Some(score) => score,
					None => {
						*reasons.entry(format!("{}.no_match", text::FILTER_NAME)).or_insert(0) += 1;

						continue;
					},
				},
				None => 0.0,
			};

			kept.push((item, score));
		}

		if self.text.is_some() {
			kept.sort_by(|(a, a_score), (b, b_score)| {
				match b_score.partial_cmp(a_score).unwrap_or(Ordering::Equal) {
					Ordering::Equal => a.id.cmp(&b.id),
					other => other,
				}
			});
		}

		let impact = FilterImpact::new(pre, kept.len(), reasons, self.active_filters());
		let page = kept.into_iter().skip(self.skip).take(self.limit).map(|(item, _)| item).collect();

		(page, impact)
	}

	fn active_filters(&self) -> Vec<&'static str> {
		let mut names: Vec<&'static str> =
			self.predicates.iter().map(|predicate| predicate.name()).collect();

		if self.text.is_some() {
			names.push(text::FILTER_NAME);
		}

		names
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FilterImpact {
	pub filters: Vec<&'static str>,
	pub candidate_count_pre: usize,
	pub candidate_count_post: usize,
	pub dropped_total: usize,
	pub top_drop_reasons: Vec<DropReason>,
}
impl FilterImpact {
	fn new(
		pre: usize,
		post: usize,
		reasons: HashMap<String, usize>,
		filters: Vec<&'static str>,
	) -> Self {
		let mut top_drop_reasons: Vec<DropReason> =
			reasons.into_iter().map(|(reason, count)| DropReason { reason, count }).collect();

		top_drop_reasons.sort_by(|a, b| match b.count.cmp(&a.count) {
			Ordering::Equal => a.reason.cmp(&b.reason),
			other => other,
		});
		top_drop_reasons.truncate(MAX_DROP_REASONS);

		Self {
			filters,
			candidate_count_pre: pre,
			candidate_count_post: post,
			dropped_total: pre.saturating_sub(post),
			top_drop_reasons,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DropReason {
	pub reason: String,
	pub count: usize,
}

fn resolve_limit(raw: Option<i64>, cfg: &Discovery) -> Result<usize> {
	let Some(raw) = raw else { return Ok(cfg.default_limit as usize) };

	if raw < 1 {
		return Err(Error::invalid(format!("limit must be a positive integer. Got {raw}.")));
	}

	Ok(raw.min(i64::from(cfg.max_limit)) as usize)
}

fn resolve_skip(raw: Option<i64>) -> Result<usize> {
	match raw {
		None => Ok(0),
		Some(raw) if raw >= 0 => Ok(raw as usize),
		Some(raw) => Err(Error::invalid(format!("skip must be zero or greater. Got {raw}."))),
	}
}
