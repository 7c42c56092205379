use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("failed to set language for parser")]
    LanguageSet,

    #[error("failed to parse source code")]
    ParseFailed,

    #[error("source text is empty")]
    EmptySource,

    #[error("malformed source: {count} syntax error(s), first at line {line}, column {column} (bytes {byte_start}..{byte_end})")]
    Malformed {
        count: usize,
        byte_start: usize,
        byte_end: usize,
        line: usize,
        column: usize,
    },

    #[error("snippet is not a valid {category}: {message}")]
    InvalidSnippet { category: String, message: String },
}
