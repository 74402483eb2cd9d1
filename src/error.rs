//! Error type shared by the simulation core and its data collaborators.
//!
//! Numerical edge cases (coincident bodies, saturated colour scale) are not
//! errors; only configuration and particle-data problems end up here.

use std::fmt;
use std::path::PathBuf;

use crate::simulation::types::BODY_GRANULARITY;

#[derive(Clone, Debug, PartialEq)]
pub enum SimError {
    /// The file initial condition was requested without any particle records.
    MissingParticleData,
    /// Fewer records than one work group; truncation would leave no bodies.
    InsufficientParticles {
        count: usize,
    },
    /// A line of particle data could not be parsed.
    MalformedRecord {
        line: usize,
        reason: String,
    },
    /// Reading a data or configuration file failed.
    Io {
        path: PathBuf,
        message: String,
    },
    /// A configuration file is not valid YAML for the expected schema.
    ConfigSyntax {
        message: String,
    },
    /// A configuration value is outside its valid range.
    InvalidConfiguration {
        reason: &'static str,
    },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingParticleData => {
                write!(f, "file initial condition selected without particle data")
            }
            Self::InsufficientParticles { count } => write!(
                f,
                "particle data has {count} records, at least {BODY_GRANULARITY} are required"
            ),
            Self::MalformedRecord { line, reason } => {
                write!(f, "malformed particle record on line {line}: {reason}")
            }
            Self::Io { path, message } => write!(f, "{}: {message}", path.display()),
            Self::ConfigSyntax { message } => write!(f, "configuration syntax: {message}"),
            Self::InvalidConfiguration { reason } => {
                write!(f, "invalid configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for SimError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_problem() {
        let err = SimError::InsufficientParticles { count: 12 };
        assert_eq!(
            err.to_string(),
            "particle data has 12 records, at least 256 are required"
        );

        let err = SimError::MalformedRecord {
            line: 3,
            reason: "expected 7 fields, found 6".into(),
        };
        assert!(err.to_string().contains("line 3"));
    }
}
