/// Errors raised while staging or committing extracted files.
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("storage path not found: {0}")]
    StoragePathNotFound(std::path::PathBuf),

    #[error("atomic rename of {from} to {to} failed: {source}")]
    AtomicRenameFailed {
        from: std::path::PathBuf,
        to: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("flushing writer for {writer_key} failed: {source}")]
    WriterFlushFailed {
        writer_key: String,
        #[source]
        source: std::io::Error,
    },
}
