use serde::Serialize;
use uuid::Uuid;

use swap_domain::{message::Message, time_serde};

use crate::{Error, Result, SwapService};

#[derive(Clone, Debug)]
pub struct SendMessageRequest {
	pub sender_id: String,
	pub recipient_id: String,
	pub text: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct SendMessageResponse {
	pub id: String,
}

#[derive(Clone, Debug)]
pub struct HistoryRequest {
	pub user_id: String,
	pub other_user_id: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct HistoryResponse {
	pub messages: Vec<Message>,
}

impl SwapService {
	pub async fn send_message(&self, req: SendMessageRequest) -> Result<SendMessageResponse> {
		let sender_id = req.sender_id.trim();
		let recipient_id = req.recipient_id.trim();

		if sender_id.is_empty() {
			return Err(Error::Unauthorized { message: "A user id is required.".to_string() });
		}
		if recipient_id.is_empty() {
			return Err(Error::invalid("recipientId must be non-empty."));
		}
		if recipient_id == sender_id {
			return Err(Error::invalid("recipientId must differ from the sender."));
		}
		if req.text.trim().is_empty() {
			return Err(Error::invalid("text must be non-empty."));
		}

		let message = Message {
			id: Uuid::new_v4().to_string(),
			sender_id: sender_id.to_string(),
			recipient_id: recipient_id.to_string(),
			text: req.text,
			sent_at: time_serde::now_utc(),
		};

		self.store.insert_message(&message).await?;

		tracing::debug!(
			message_id = message.id.as_str(),
			sender_id = message.sender_id.as_str(),
			recipient_id = message.recipient_id.as_str(),
			"Message stored."
		);

		Ok(SendMessageResponse { id: message.id })
	}

	/// Every message exchanged with `other_user_id`, oldest first.
	pub async fn message_history(&self, req: HistoryRequest) -> Result<HistoryResponse> {
		if req.user_id.trim().is_empty() {
			return Err(Error::Unauthorized { message: "A user id is required.".to_string() });
		}

		let other = req.other_user_id.trim();

		if other.is_empty() {
			return Err(Error::invalid("otherUserId is required."));
		}

		let messages = self.store.messages_between(&req.user_id, other).await?;

		Ok(HistoryResponse { messages })
	}
}
