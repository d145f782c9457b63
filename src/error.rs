//! The crate-wide [`Error`] type. Every fallible operation in the crate
//! returns [`Result`]; the binary converts the error into a message and a
//! non-zero exit status.

use thiserror::Error;

/// The result of a fallible blog operation.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Returned when an operation references a post id that is not in the
    /// store. No mutation has been performed.
    #[error("no post with id {0}")]
    NotFound(i64),

    /// Returned for malformed input (empty title, empty tag line, an
    /// unmodified post template). Raised before any store write.
    #[error("{0}")]
    Validation(String),

    /// Returned when a uniqueness constraint cannot be recovered locally,
    /// e.g. a filename collision that survives disambiguation.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// Returned for header/footer template parse or execution problems.
    #[error("template: {0}")]
    Template(String),

    /// Returned for bad or missing configuration values.
    #[error("configuration: {0}")]
    Config(String),

    /// Returned for database errors.
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),

    /// Returned for problems reading or writing the output tree.
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when a stored timestamp does not parse.
    #[error("timestamp: {0}")]
    DateTimeParse(#[from] chrono::ParseError),

    /// Returned when the project file does not deserialize.
    #[error("project file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
