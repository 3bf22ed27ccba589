use thiserror::Error;

/// Errors raised by the note repository core.
///
/// Validation findings are not errors: the validator accumulates them as
/// plain strings and never aborts a scan.
#[derive(Debug, Error)]
pub enum KbError {
    /// A document cannot be split into frontmatter and body, or the
    /// frontmatter block does not parse to a mapping of the expected shape.
    #[error("{0}")]
    Format(String),

    /// The rule-set configuration is missing or malformed. Always fatal.
    #[error("{0}")]
    Rules(String),

    /// An external tool (git, rg) could not be launched or exited with an
    /// unexpected status.
    #[error("{tool}: {context}")]
    ExternalTool {
        tool: &'static str,
        context: String,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl KbError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        KbError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn git(context: impl Into<String>) -> Self {
        KbError::ExternalTool {
            tool: "git",
            context: context.into(),
        }
    }
}
