use thiserror::Error;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("lookup service returned status {0}")]
    Status(u16),
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write record {id} to table {table}")]
    Write {
        id: String,
        table: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("sink write failed: {0}")]
    Sink(#[from] SinkError),
}
