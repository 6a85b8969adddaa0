//! The kernel's validation-failure error kind.
//!
//! All contract violations raise a single error type, [`ContractError`],
//! carrying a typed [`ErrorCode`]. Validation always precedes mutation: a
//! rejected call leaves every piece of observable state exactly as it was.
//!
//! Violations of internal invariants (a registry entry known to exist
//! suddenly missing, a double borrow of a data manager) are programming
//! errors, not contract errors — those panic and abort the run.

use std::error::Error;
use std::fmt;

/// Typed code identifying which contract a caller violated.
///
/// Code names are stable and appear in `Display` output in
/// SCREAMING_SNAKE form, matching the documented error table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Two plugins in the same simulation share an id.
    DuplicatePluginId,
    /// A plugin depends on a plugin id that is not present.
    MissingPluginDependency,
    /// The plugin dependency graph contains a cycle.
    CircularPluginDependencies,
    /// A data manager of the same type is already registered.
    DuplicateDataManager,
    /// No initialized data manager of the requested type exists.
    UnknownDataManager,
    /// A plan was scheduled for a time earlier than the current clock.
    PastPlanTime,
    /// A plan time was NaN or infinite.
    NonFinitePlanTime,
    /// A keyed plan was added while another plan holds the same key.
    DuplicatePlanKey,
    /// A subscription or labeler was registered after initialization.
    RegistrationClosed,
    /// A labeler for the same event type and dimension already exists.
    DuplicateEventLabeler,
    /// A property with this id is already defined.
    DuplicatePropertyDefinition,
    /// No property with this id is defined.
    UnknownPropertyId,
    /// The entity index is outside the managed id range.
    UnknownEntityId,
    /// A write was attempted against an immutable property.
    ImmutableValue,
    /// A value's kind does not match the property definition.
    IncompatibleValue,
    /// A container was constructed from a definition of the wrong kind.
    IncompatibleDefinition,
    /// A no-default property definition left some existing ids unassigned.
    InsufficientPropertyValueAssignment,
    /// An assignment-time query was made with time tracking disabled.
    AssignmentTimeNotTracked,
}

impl ErrorCode {
    /// The stable SCREAMING_SNAKE name of this code.
    pub fn name(self) -> &'static str {
        match self {
            Self::DuplicatePluginId => "DUPLICATE_PLUGIN_ID",
            Self::MissingPluginDependency => "MISSING_PLUGIN_DEPENDENCY",
            Self::CircularPluginDependencies => "CIRCULAR_PLUGIN_DEPENDENCIES",
            Self::DuplicateDataManager => "DUPLICATE_DATA_MANAGER",
            Self::UnknownDataManager => "UNKNOWN_DATA_MANAGER",
            Self::PastPlanTime => "PAST_PLAN_TIME",
            Self::NonFinitePlanTime => "NON_FINITE_PLAN_TIME",
            Self::DuplicatePlanKey => "DUPLICATE_PLAN_KEY",
            Self::RegistrationClosed => "REGISTRATION_CLOSED",
            Self::DuplicateEventLabeler => "DUPLICATE_EVENT_LABELER",
            Self::DuplicatePropertyDefinition => "DUPLICATE_PROPERTY_DEFINITION",
            Self::UnknownPropertyId => "UNKNOWN_PROPERTY_ID",
            Self::UnknownEntityId => "UNKNOWN_ENTITY_ID",
            Self::ImmutableValue => "IMMUTABLE_VALUE",
            Self::IncompatibleValue => "INCOMPATIBLE_VALUE",
            Self::IncompatibleDefinition => "INCOMPATIBLE_DEFINITION",
            Self::InsufficientPropertyValueAssignment => {
                "INSUFFICIENT_PROPERTY_VALUE_ASSIGNMENT"
            }
            Self::AssignmentTimeNotTracked => "ASSIGNMENT_TIME_NOT_TRACKED",
        }
    }

    /// Human-readable description of the violated contract.
    pub fn description(self) -> &'static str {
        match self {
            Self::DuplicatePluginId => "a plugin with this id is already present",
            Self::MissingPluginDependency => "a declared plugin dependency is not present",
            Self::CircularPluginDependencies => "the plugin dependency graph has a cycle",
            Self::DuplicateDataManager => "a data manager of this type is already registered",
            Self::UnknownDataManager => "no initialized data manager of this type exists",
            Self::PastPlanTime => "plan time is earlier than the current clock",
            Self::NonFinitePlanTime => "plan time must be finite",
            Self::DuplicatePlanKey => "an active plan already holds this key",
            Self::RegistrationClosed => {
                "subscriptions and labelers must be registered during initialization"
            }
            Self::DuplicateEventLabeler => {
                "a labeler for this event type and dimension already exists"
            }
            Self::DuplicatePropertyDefinition => "a property with this id is already defined",
            Self::UnknownPropertyId => "no property with this id is defined",
            Self::UnknownEntityId => "entity index is outside the managed id range",
            Self::ImmutableValue => "property values are immutable",
            Self::IncompatibleValue => "value kind does not match the property definition",
            Self::IncompatibleDefinition => "definition kind does not match the container",
            Self::InsufficientPropertyValueAssignment => {
                "a no-default property requires explicit values for all existing ids"
            }
            Self::AssignmentTimeNotTracked => "assignment times are not tracked",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The single error kind raised by kernel validation failures.
///
/// Carries the violated [`ErrorCode`] and, optionally, a detail string
/// naming the offending id or value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractError {
    /// The violated contract.
    pub code: ErrorCode,
    detail: Option<String>,
}

impl ContractError {
    /// A contract error with no additional detail.
    pub fn new(code: ErrorCode) -> Self {
        Self { code, detail: None }
    }

    /// A contract error with a detail string naming the offender.
    pub fn with_detail(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: Some(detail.into()),
        }
    }

    /// The detail string, if one was attached.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl fmt::Display for ContractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.name(), self.code.description())?;
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

impl Error for ContractError {}

impl From<ErrorCode> for ContractError {
    fn from(code: ErrorCode) -> Self {
        Self::new(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_code_and_description() {
        let err = ContractError::new(ErrorCode::PastPlanTime);
        let text = err.to_string();
        assert!(text.starts_with("PAST_PLAN_TIME:"));
        assert!(text.contains("earlier than the current clock"));
    }

    #[test]
    fn display_appends_detail() {
        let err = ContractError::with_detail(ErrorCode::UnknownPropertyId, "property 7");
        assert!(err.to_string().ends_with("(property 7)"));
        assert_eq!(err.detail(), Some("property 7"));
    }

    #[test]
    fn code_conversion() {
        let err: ContractError = ErrorCode::ImmutableValue.into();
        assert_eq!(err.code, ErrorCode::ImmutableValue);
    }
}
