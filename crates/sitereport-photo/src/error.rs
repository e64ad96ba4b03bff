use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhotoError {
    #[error("image is {size} bytes; the upload limit is {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    #[error("unsupported content type: {0}")]
    UnsupportedType(String),

    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("malformed data URL: {0}")]
    DataUrl(String),
}
