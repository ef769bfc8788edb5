use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("refusing to save chat {id}: transcript is empty")]
    EmptyTranscript { id: String },

    #[error("no saved chat with id {0}")]
    NotFound(String),
}
