use thiserror::Error;

#[derive(Error, Debug)]
pub enum SslcError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV Writing Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Parse Error (line {line}): {message}")]
    Parse { line: usize, message: String },

    #[error("Unsupported field kind '{type_name}' for member '{member}' of struct '{record}' (line {line})")]
    UnsupportedFieldKind {
        record: String,
        member: String,
        type_name: String,
        line: usize,
    },

    #[error("Enum '{name}' declares {members} members, more than a 4-byte index can address")]
    EnumTooLarge { name: String, members: u64 },

    #[error("Invalid field size {0}: must be between 1 and 32 bytes")]
    InvalidSize(u32),

    #[error("Configuration Error: {0}")]
    Config(String),
}

pub type SslcResult<T> = Result<T, SslcError>;
