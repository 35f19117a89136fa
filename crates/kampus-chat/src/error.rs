use kampus_nlu::PhraseBookError;
use kampus_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    /// A record lookup failed. Surfaced as-is: no retry, no partial reply.
    #[error(transparent)]
    CollaboratorFailure(#[from] StoreError),

    #[error("invalid phrase book: {0}")]
    PhraseBook(#[from] PhraseBookError),
}
