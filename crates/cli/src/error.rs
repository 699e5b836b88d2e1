//! Failures of the `lava-lamp` binary.
//!
//! Each variant maps to a process exit code:
//! - 2:  clap usage error, including a malformed `--resize-at` (raised
//!   before [`CliError`] exists)
//! - 10: the lamp rejected its config or size
//! - 11: reading the config file, creating the sequence directory or
//!   writing a PNG
//! - 12: a malformed `--params` or `--background` value
//! - 13: encoding the `--json` report

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use lava_lamp_core::EngineError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Lamp(EngineError),

    /// Config read or PNG write; the message already names the path.
    #[error("{0}")]
    File(String),

    #[error("cannot create sequence directory {}: {source}", path.display())]
    SequenceDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid --params JSON: {0}")]
    Params(#[source] serde_json::Error),

    #[error("invalid --background '{value}': {source}")]
    Background {
        value: String,
        #[source]
        source: EngineError,
    },

    #[error("cannot encode report: {0}")]
    Report(#[from] serde_json::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Lamp(_) => 10,
            CliError::File(_) | CliError::SequenceDir { .. } => 11,
            CliError::Params(_) | CliError::Background { .. } => 12,
            CliError::Report(_) => 13,
        }
    }
}

/// Engine I/O failures come from the config file or a PNG, everything
/// else from the lamp itself.
impl From<EngineError> for CliError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Io(msg) => CliError::File(msg),
            other => CliError::Lamp(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    use lava_lamp_core::{LampConfig, Srgb};

    #[test]
    fn rejected_size_is_a_lamp_error() {
        let err = CliError::from(EngineError::InvalidDimensions);
        assert!(matches!(err, CliError::Lamp(_)));
        assert_eq!(err.exit_code(), 10);
        assert_eq!(err.to_string(), EngineError::InvalidDimensions.to_string());
    }

    #[test]
    fn missing_config_file_is_a_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lamp.json");
        let err = CliError::from(LampConfig::load(&path).unwrap_err());
        assert!(matches!(err, CliError::File(_)));
        assert_eq!(err.exit_code(), 11);
        assert!(err.to_string().contains("lamp.json"), "{err}");
    }

    #[test]
    fn sequence_dir_failure_names_the_directory() {
        let err = CliError::SequenceDir {
            path: PathBuf::from("frames/out"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.exit_code(), 11);
        assert!(err.to_string().contains("frames/out"));
        assert!(err.source().is_some());
    }

    #[test]
    fn bad_params_json_names_the_flag() {
        let parse = serde_json::from_str::<serde_json::Value>("{\"seed\": ");
        let err = CliError::Params(parse.unwrap_err());
        assert_eq!(err.exit_code(), 12);
        assert!(err.to_string().starts_with("invalid --params JSON"));
        assert!(err.source().is_some());
    }

    #[test]
    fn bad_background_keeps_the_value() {
        let err = CliError::Background {
            value: "teal".into(),
            source: Srgb::from_hex("teal").unwrap_err(),
        };
        assert_eq!(err.exit_code(), 12);
        assert!(err.to_string().contains("'teal'"));
    }

    #[test]
    fn report_encoding_failure_is_exit_13() {
        let failure = serde_json::from_str::<serde_json::Value>("[1,").unwrap_err();
        let err: CliError = failure.into();
        assert!(matches!(err, CliError::Report(_)));
        assert_eq!(err.exit_code(), 13);
    }
}
