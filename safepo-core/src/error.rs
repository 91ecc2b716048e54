//! Errors in the library.
use thiserror::Error;

/// Errors raised while building a run configuration.
#[derive(Error, Debug)]
pub enum SafepoError {
    /// The requested task is not one of the supported tasks.
    #[error("Unrecognized task: {0}")]
    UnknownTask(String),

    /// The task needs the physics simulator, which could not be found.
    #[error("Please install {0} to run ShadowHand tasks!")]
    SimulatorUnavailable(String),

    /// A section expected in a config file is missing.
    #[error("Missing section `{section}` in {file}")]
    MissingSection {
        /// Name of the missing section.
        section: String,
        /// File the section was looked up in.
        file: String,
    },

    /// A YAML document or section is not a mapping.
    #[error("Expected a mapping: {0}")]
    NotAMapping(String),

    /// A command line value could not be parsed.
    #[error("Invalid value `{value}` for {name}")]
    InvalidValue {
        /// Name of the flag.
        name: &'static str,
        /// The rejected value.
        value: String,
    },
}
