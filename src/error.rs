use std::fmt;

/// Fatal conditions that abort a merge run.
///
/// Every variant maps to exit status 1. They travel inside `anyhow::Error` so that
/// I/O context can be attached; use `downcast_ref::<MergeError>()` to recover the kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    /// Missing or invalid command-line arguments.
    Configuration(String),
    /// An input or output store could not be opened.
    StoreOpen(String),
    /// Unrecognized header line or a required header tag is absent.
    Format(String),
    /// The two `@HD` lines differ.
    HeaderMismatch { first: String, second: String },
    /// A read name did not sort strictly after the previously accepted one.
    OutOfOrder { previous: String, current: String },
    /// A paired record has no mate directly behind it.
    MissingMate { name: String, source: u8 },
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "configuration error: {msg}"),
            Self::StoreOpen(msg) => write!(f, "could not open store: {msg}"),
            Self::Format(msg) => write!(f, "header format error: {msg}"),
            Self::HeaderMismatch { first, second } => write!(
                f,
                "the header lines (@HD) are different: {first:?} vs {second:?}"
            ),
            Self::OutOfOrder { previous, current } => write!(
                f,
                "entries are not sorted by name: {current} follows {previous}; \
                 sort both BAM files by name (samtools sort -n)"
            ),
            Self::MissingMate { name, source } => write!(
                f,
                "a widow was encountered in input file {source}: {name} has no mate; \
                 check that all paired reads have a mate or sort your BAM files by name"
            ),
        }
    }
}

impl std::error::Error for MergeError {}
