#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(sqlx::Error),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("Not found: {0}")]
	NotFound(String),
	#[error("Conflict: {0}")]
	Conflict(String),
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		match &err {
			sqlx::Error::Database(db_err) if db_err.is_unique_violation() => Self::Conflict(
				db_err.constraint().map(str::to_string).unwrap_or_else(|| db_err.message().to_string()),
			),
			_ => Self::Sqlx(err),
		}
	}
}
