//! Error handling in [`kube-config`][crate]
use std::{path::PathBuf, sync::Arc};

use thiserror::Error;

/// Possible errors when resolving a [`Configuration`](crate::Configuration)
///
/// Errors are cheap to clone so that memoized resolutions can hand the same
/// failure to every caller.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// A key the kubeconfig format requires was absent
    #[error("missing required field '{field}' in {block}")]
    MissingRequiredField {
        /// Name of the missing key
        field: &'static str,
        /// Description of the block that should have contained it
        block: String,
    },

    /// A context names a cluster or user that is not defined
    #[error("context '{context}' references unknown {kind} '{name}'")]
    UnresolvableReference {
        /// Either `cluster` or `user`
        kind: &'static str,
        /// The name that failed to resolve
        name: String,
        /// The context holding the reference
        context: String,
    },

    /// A required environment variable was not set
    #[error("environment variable {name} must be defined")]
    MissingEnvironmentVariable {
        /// Name of the variable
        name: &'static str,
    },

    /// Failed to read a file
    #[error("failed to read '{path:?}': {source}")]
    ReadFile {
        /// The file that could not be read
        path: PathBuf,
        /// Underlying io error
        #[source]
        source: Arc<std::io::Error>,
    },

    /// A timestamp matched none of the accepted formats
    #[error("failed to parse timestamp '{value}': {source}")]
    DateParse {
        /// The raw timestamp
        value: String,
        /// Error from the last format attempted
        #[source]
        source: chrono::ParseError,
    },

    /// The YAML document did not have the expected shape
    #[error("failed to parse kubeconfig YAML: {0}")]
    MalformedDocument(#[source] Arc<serde_yaml::Error>),

    /// Inline credential data was not valid base64
    #[error("failed to decode base64 in '{field}': {source}")]
    Base64Decode {
        /// The `*-data` key holding the bad value
        field: &'static str,
        /// Underlying decode error
        #[source]
        source: base64::DecodeError,
    },

    /// A config source value could not be turned into a local file path
    #[error("'{url}' is not a valid file url")]
    InvalidFileUrl {
        /// The offending value
        url: String,
    },

    /// The home directory could not be determined
    #[error("unable to find the home directory for the default kubeconfig")]
    NoHomeDirectory,

    /// A context selected by name was not defined
    #[error("unable to load context: {context_name}")]
    LoadContext {
        /// The name that was requested
        context_name: String,
    },
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::MalformedDocument(Arc::new(err))
    }
}
