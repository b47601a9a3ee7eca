use swap_config::DiscoveryText;
use swap_domain::{fuzzy, item::Item};

/// Name reported in filter impact, and the prefix of its drop reason.
pub const FILTER_NAME: &str = "text";

const TITLE_WEIGHT: f32 = 2.0;
const BODY_WEIGHT: f32 = 1.0;

#[derive(Clone, Debug, PartialEq)]
struct QueryToken {
	text: String,
	edits: u32,
}

/// Approximate phrase match over an item's searchable text, with a relevance score.
///
/// Any query token landing within its edit budget of any target token is a match. The score sums,
/// per query token, the best similarity found, with title hits weighted double.
#[derive(Clone, Debug, PartialEq)]
pub struct FuzzyTextMatcher {
	tokens: Vec<QueryToken>,
	include_description: bool,
	include_tags: bool,
}
impl FuzzyTextMatcher {
	/// Returns `None` for a phrase with no searchable words.
	pub fn new(phrase: &str, cfg: &DiscoveryText) -> Option<Self> {
		let tokens: Vec<QueryToken> = fuzzy::tokenize(phrase)
			.into_iter()
			.map(|text| {
				let edits = if cfg.preserve_trailing_space_quirk {
					0
				} else {
					fuzzy::max_edits(cfg.min_similarity, text.chars().count())
				};

				QueryToken { text, edits }
			})
			.collect();

		if tokens.is_empty() {
			return None;
		}

		Some(Self {
			tokens,
			include_description: cfg.include_description,
			include_tags: cfg.include_tags,
		})
	}

	pub fn score(&self, item: &Item) -> Option<f32> {
		let targets = self.targets(item);
		let mut total = 0.0;
		let mut matched = false;

		for token in &self.tokens {
			let mut best: Option<f32> = None;

			for (target, weight) in &targets {
				let Some(distance) = fuzzy::bounded_levenshtein(&token.text, target, token.edits)
				else {
					continue;
				};
				let weighted = fuzzy::similarity(&token.text, target, distance) * weight;

				if best.is_none_or(|current| weighted > current) {
					best = Some(weighted);
				}
			}

			if let Some(best) = best {
				total += best;
				matched = true;
			}
		}

		matched.then_some(total)
	}

	fn targets(&self, item: &Item) -> Vec<(String, f32)> {
		let mut targets: Vec<(String, f32)> =
			fuzzy::tokenize(&item.title).into_iter().map(|token| (token, TITLE_WEIGHT)).collect();

		if self.include_description {
			targets.extend(fuzzy::tokenize(&item.description).into_iter().map(|t| (t, BODY_WEIGHT)));
		}
		if self.include_tags {
			for category in &item.categories {
				targets.extend(fuzzy::tokenize(category).into_iter().map(|t| (t, BODY_WEIGHT)));
			}
			for value in item.attributes.values() {
				targets.extend(fuzzy::tokenize(value).into_iter().map(|t| (t, BODY_WEIGHT)));
			}
		}

		targets
	}
}
