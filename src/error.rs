//! Error types for the shift roster engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while resolving shifts, applying
//! allocation batches and building allowance reports.

use chrono::NaiveDate;
use thiserror::Error;

/// The main error type for the shift roster engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently from storage up to the HTTP layer.
///
/// # Example
///
/// ```
/// use shift_roster::error::RosterError;
///
/// let error = RosterError::Forbidden {
///     reason: "Not authorized for this project".to_string(),
/// };
/// assert_eq!(error.to_string(), "Forbidden: Not authorized for this project");
/// ```
#[derive(Debug, Error)]
pub enum RosterError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A referenced entity does not exist.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// The kind of entity (e.g. "Project").
        entity: &'static str,
        /// The key that was looked up.
        key: String,
    },

    /// No active shift version covers the requested date.
    #[error("No active shift found for project={project_id}, shift_code={shift_code}, date={date}")]
    ShiftNotResolved {
        /// The project the shift belongs to.
        project_id: i64,
        /// The shift code that was looked up.
        shift_code: String,
        /// The date that no version covers.
        date: NaiveDate,
    },

    /// The caller could not be identified.
    #[error("Unauthorized: {reason}")]
    Unauthorized {
        /// Why identification failed.
        reason: String,
    },

    /// The caller is identified but not allowed to perform the operation.
    #[error("Forbidden: {reason}")]
    Forbidden {
        /// Why access was denied.
        reason: String,
    },

    /// A duplicate creation attempt.
    #[error("Conflict: {message}")]
    Conflict {
        /// A description of the conflicting record.
        message: String,
    },

    /// Input was rejected before any mutation took place.
    #[error("Validation failed: {message}")]
    Validation {
        /// A description of the invalid input.
        message: String,
    },

    /// The storage layer failed.
    #[error("Storage error: {message}")]
    Storage {
        /// The underlying storage error.
        message: String,
    },
}

impl RosterError {
    /// Shorthand for a [`RosterError::NotFound`] with a displayable key.
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        RosterError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Shorthand for a [`RosterError::Forbidden`].
    pub fn forbidden(reason: impl Into<String>) -> Self {
        RosterError::Forbidden {
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`RosterError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        RosterError::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a [`RosterError::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        RosterError::Conflict {
            message: message.into(),
        }
    }
}

impl From<sqlx::Error> for RosterError {
    fn from(error: sqlx::Error) -> Self {
        RosterError::Storage {
            message: error.to_string(),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for RosterError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        RosterError::Storage {
            message: format!("migration failed: {}", error),
        }
    }
}

/// A type alias for Results that return RosterError.
pub type RosterResult<T> = Result<T, RosterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_displays_path() {
        let error = RosterError::ConfigNotFound {
            path: "/missing/roster.yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/roster.yaml"
        );
    }

    #[test]
    fn test_not_found_displays_entity_and_key() {
        let error = RosterError::not_found("Project", 42);
        assert_eq!(error.to_string(), "Project not found: 42");
    }

    #[test]
    fn test_shift_not_resolved_displays_lookup() {
        let error = RosterError::ShiftNotResolved {
            project_id: 3,
            shift_code: "MORNING".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
        };
        assert_eq!(
            error.to_string(),
            "No active shift found for project=3, shift_code=MORNING, date=2024-01-08"
        );
    }

    #[test]
    fn test_conflict_and_validation_display() {
        assert_eq!(
            RosterError::conflict("Employee already assigned").to_string(),
            "Conflict: Employee already assigned"
        );
        assert_eq!(
            RosterError::validation("from_date must not be after to_date").to_string(),
            "Validation failed: from_date must not be after to_date"
        );
    }

    #[test]
    fn test_sqlx_error_maps_to_storage() {
        let error: RosterError = sqlx::Error::RowNotFound.into();
        assert!(matches!(error, RosterError::Storage { .. }));
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<RosterError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_forbidden() -> RosterResult<()> {
            Err(RosterError::forbidden("Not a lead"))
        }

        fn propagates_error() -> RosterResult<()> {
            returns_forbidden()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
