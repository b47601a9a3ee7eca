use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
	pub id: String,
	pub sender_id: String,
	pub recipient_id: String,
	pub text: String,
	#[serde(with = "crate::time_serde")]
	pub sent_at: OffsetDateTime,
}
impl Message {
	pub fn involves(&self, user_id: &str) -> bool {
		self.sender_id == user_id || self.recipient_id == user_id
	}

	/// The other participant from `user_id`'s point of view, or `None` when the user is not a
	/// participant.
	pub fn counterpart(&self, user_id: &str) -> Option<&str> {
		if self.sender_id == user_id {
			Some(self.recipient_id.as_str())
		} else if self.recipient_id == user_id {
			Some(self.sender_id.as_str())
		} else {
			None
		}
	}
}
