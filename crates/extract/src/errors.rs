/// Errors raised while pulling resources and staging their items.
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error("resource {resource:?} failed: {message}")]
    ResourceFailed { resource: String, message: String },

    #[error(transparent)]
    Storage(#[from] storage::StorageError),
}
