//! Collapses a user's message history into one entry per counterpart.

use std::{
	cmp::Ordering,
	collections::{HashMap, hash_map::Entry},
	fmt,
};

use serde::Serialize;

use crate::message::Message;

/// Order-independent identity of a two-party conversation. `low` sorts before `high`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ConversationKey {
	pub low: String,
	pub high: String,
}
impl ConversationKey {
	pub fn new(a: &str, b: &str) -> Self {
		if a <= b {
			Self { low: a.to_string(), high: b.to_string() }
		} else {
			Self { low: b.to_string(), high: a.to_string() }
		}
	}

	pub fn for_message(message: &Message) -> Self {
		Self::new(&message.sender_id, &message.recipient_id)
	}
}
impl fmt::Display for ConversationKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.low, self.high)
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conversation {
	pub key: ConversationKey,
	pub counterpart_id: String,
	pub latest: Message,
}

/// Most recent message per distinct counterpart of `user_id`, newest conversation first.
///
/// Within a conversation the message with the greatest `(sent_at, id)` wins, so the result does
/// not depend on input order. Messages that do not name `user_id` are ignored.
pub fn reduce<I>(user_id: &str, messages: I) -> Vec<Conversation>
where
	I: IntoIterator<Item = Message>,
{
	let mut latest: HashMap<ConversationKey, Message> = HashMap::new();

	for message in messages {
		if !message.involves(user_id) {
			continue;
		}

		match latest.entry(ConversationKey::for_message(&message)) {
			Entry::Vacant(slot) => {
				slot.insert(message);
			},
			Entry::Occupied(mut slot) =>
				if is_later(&message, slot.get()) {
					slot.insert(message);
				},
		}
	}

	let mut out: Vec<Conversation> = latest
		.into_iter()
		.map(|(key, message)| {
			let counterpart_id =
				message.counterpart(user_id).map(str::to_string).unwrap_or_else(|| user_id.to_string());

			Conversation { key, counterpart_id, latest: message }
		})
		.collect();

	out.sort_by(|a, b| match b.latest.sent_at.cmp(&a.latest.sent_at) {
		Ordering::Equal => a.key.cmp(&b.key),
		other => other,
	});

	out
}

fn is_later(candidate: &Message, current: &Message) -> bool {
	(candidate.sent_at, candidate.id.as_str()) > (current.sent_at, current.id.as_str())
}

#[cfg(test)]
mod tests {
	use time::{Duration, OffsetDateTime};

	use crate::{
		conversation::{ConversationKey, reduce},
		message::Message,
	};

	fn message(id: &str, from: &str, to: &str, offset_secs: i64) -> Message {
		Message {
			id: id.to_string(),
			sender_id: from.to_string(),
			recipient_id: to.to_string(),
			text: format!("message {id}"),
			sent_at: OffsetDateTime::UNIX_EPOCH + Duration::seconds(offset_secs),
		}
	}

	#[test]
	fn key_is_order_independent() {
		let forward = ConversationKey::new("alice", "bob");
		let backward = ConversationKey::new("bob", "alice");

		assert_eq!(forward, backward);
		assert_eq!(forward.to_string(), "alice:bob");
	}

	#[test]
	fn no_messages_yield_no_conversations() {
		assert!(reduce("u", Vec::new()).is_empty());
	}

	#[test]
	fn direction_does_not_split_conversations() {
		let conversations =
			reduce("u", vec![message("1", "u", "v", 1), message("2", "v", "u", 2)]);

		assert_eq!(conversations.len(), 1);
		assert_eq!(conversations[0].latest.id, "2");
		assert_eq!(conversations[0].counterpart_id, "v");
	}

	#[test]
	fn equal_timestamps_break_on_message_id_regardless_of_order() {
		let a = message("a", "u", "v", 5);
		let b = message("b", "v", "u", 5);
		let forward = reduce("u", vec![a.clone(), b.clone()]);
		let backward = reduce("u", vec![b, a]);

		assert_eq!(forward, backward);
		assert_eq!(forward[0].latest.id, "b");
	}

	#[test]
	fn unrelated_messages_are_ignored() {
		let conversations =
			reduce("u", vec![message("1", "v", "w", 9), message("2", "u", "w", 1)]);

		assert_eq!(conversations.len(), 1);
		assert_eq!(conversations[0].counterpart_id, "w");
	}

	#[test]
	fn ties_on_time_order_by_key() {
		let conversations =
			reduce("m", vec![message("1", "m", "z", 3), message("2", "a", "m", 3)]);
		let keys: Vec<String> = conversations.iter().map(|c| c.key.to_string()).collect();

		assert_eq!(keys, vec!["a:m".to_string(), "m:z".to_string()]);
	}
}
