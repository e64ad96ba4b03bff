use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("please enter {0}")]
    MissingField(&'static str),

    #[error("a report must keep at least one page")]
    LastPage,

    #[error("page index {index} is out of range (report has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },

    #[error("page {0} has no photo")]
    NoPhoto(usize),

    #[error("report not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("corrupt report data: {0}")]
    Corrupt(String),
}
