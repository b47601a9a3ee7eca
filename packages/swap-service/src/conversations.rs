use serde::Serialize;

use swap_domain::{conversation, message::Message};

use crate::{Error, Result, SwapService};

#[derive(Clone, Debug)]
pub struct ConversationsRequest {
	pub user_id: String,
}

/// The latest message of one conversation, tagged with who it is with.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationView {
	#[serde(flatten)]
	pub message: Message,
	pub counterpart_id: String,
	pub conversation_key: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ConversationsResponse {
	pub conversations: Vec<ConversationView>,
}

impl SwapService {
	pub async fn conversations(&self, req: ConversationsRequest) -> Result<ConversationsResponse> {
		let user_id = req.user_id.trim();

		if user_id.is_empty() {
			return Err(Error::Unauthorized { message: "A user id is required.".to_string() });
		}

		let history = self.store.messages_involving(user_id).await?;
		let total = history.len();
		let conversations: Vec<ConversationView> = conversation::reduce(user_id, history)
			.into_iter()
			.map(|conversation| ConversationView {
				conversation_key: conversation.key.to_string(),
				counterpart_id: conversation.counterpart_id,
				message: conversation.latest,
			})
			.collect();

		tracing::debug!(
			user_id,
			messages = total,
			conversations = conversations.len(),
			"Reduced message history."
		);

		Ok(ConversationsResponse { conversations })
	}
}
