/// Domain-level errors shared by the agent and article services.
///
/// The HTTP layer maps each variant to a status code and error code; the
/// display text is returned to clients as-is.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Agent(String),

    #[error("{0}")]
    ArticleGeneration(String),
}
