pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Unauthorized: {message}")]
	Unauthorized { message: String },
	#[error("Forbidden: {message}")]
	Forbidden { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl Error {
	pub(crate) fn invalid(message: impl Into<String>) -> Self {
		Self::InvalidRequest { message: message.into() }
	}
}
impl From<swap_storage::Error> for Error {
	fn from(err: swap_storage::Error) -> Self {
		match err {
			swap_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			swap_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			swap_storage::Error::NotFound(message) => Self::NotFound { message },
			swap_storage::Error::Conflict(message) => Self::Conflict { message },
		}
	}
}
impl From<swap_domain::attributes::AttributeError> for Error {
	fn from(err: swap_domain::attributes::AttributeError) -> Self {
		Self::InvalidRequest { message: err.to_string() }
	}
}
