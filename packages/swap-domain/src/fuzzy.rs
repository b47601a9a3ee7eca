//! Token normalization and bounded edit distance for approximate text matching.

use std::collections::HashSet;

use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

pub const MAX_EDITS: u32 = 2;

// (1.0 - 0.8) * 5.0 lands just below 1.0 in floating point.
const EDIT_EPSILON: f32 = 1e-4;

/// NFKC-normalizes and lowercases `text`, then splits it into Unicode words. Duplicate tokens
/// are dropped, first occurrence wins.
pub fn tokenize(text: &str) -> Vec<String> {
	let normalized: String = text.nfkc().collect::<String>().to_lowercase();
	let mut out = Vec::new();
	let mut seen = HashSet::new();

	for word in normalized.unicode_words() {
		if seen.insert(word) {
			out.push(word.to_string());
		}
	}

	out
}

/// Edits tolerated for a token of `chars` characters.
///
/// Values below 1.0 are a normalized similarity. Values of 1.0 or more are a whole edit count.
/// Either way the result never exceeds [`MAX_EDITS`].
pub fn max_edits(min_similarity: f32, chars: usize) -> u32 {
	if !min_similarity.is_finite() || min_similarity < 0.0 {
		return 0;
	}

	let edits = if min_similarity >= 1.0 {
		min_similarity.floor()
	} else {
		((1.0 - min_similarity) * chars as f32 + EDIT_EPSILON).floor()
	};

	(edits as u32).min(MAX_EDITS)
}

/// Edit distance between `a` and `b` if it is at most `max`.
pub fn bounded_levenshtein(a: &str, b: &str, max: u32) -> Option<usize> {
	let a: Vec<char> = a.chars().collect();
	let b: Vec<char> = b.chars().collect();

	distance(&a, &b, max as usize)
}

/// Normalized similarity in 0.0-1.0 for two tokens `distance` edits apart.
pub fn similarity(a: &str, b: &str, distance: usize) -> f32 {
	let longest = a.chars().count().max(b.chars().count());

	if longest == 0 {
		return 1.0;
	}

	1.0 - (distance.min(longest) as f32 / longest as f32)
}

fn distance(a: &[char], b: &[char], max: usize) -> Option<usize> {
	if a.len().abs_diff(b.len()) > max {
		return None;
	}
	if a.is_empty() {
		return Some(b.len());
	}
	if b.is_empty() {
		return Some(a.len());
	}

	let mut prev: Vec<usize> = (0..=b.len()).collect();
	let mut curr = vec![0; b.len() + 1];

	for (i, ca) in a.iter().enumerate() {
		curr[0] = i + 1;

		let mut row_min = curr[0];

		for (j, cb) in b.iter().enumerate() {
			let cost = usize::from(ca != cb);

			curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
			row_min = row_min.min(curr[j + 1]);
		}

		if row_min > max {
			return None;
		}

		std::mem::swap(&mut prev, &mut curr);
	}

	let result = prev[b.len()];

	if result > max { None } else { Some(result) }
}
