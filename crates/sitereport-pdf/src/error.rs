use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("report has no pages")]
    EmptyReport,

    #[error("failed to assemble PDF: {0}")]
    Pdf(String),
}
