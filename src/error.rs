use thiserror::Error;

/// Errors surfaced at the edges of the pipeline.
///
/// The numeric pipeline itself never fails; these come from decoding and
/// from entry points that need information the caller did not supply.
#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Could not decode image {path}: {source}")]
    ImageDecode {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Cannot infer timeframe from '{0}'; pass one explicitly")]
    UnknownTimeframe(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ChartError>;
