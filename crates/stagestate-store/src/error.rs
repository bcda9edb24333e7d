use std::fmt;

/// Errors from typed state store operations.
///
/// Every variant reflects a caller-side contract violation. None of them is
/// transient, so there is no retry path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// A singleton insertion targeted a key that already holds a singleton.
    #[error("set_data called twice with same name: {key}")]
    DuplicateName { key: String },

    /// A singleton read targeted a key with no singleton entry.
    #[error("get_data called for unknown data name: {key}")]
    UnknownName { key: String },

    /// A stored value cannot be viewed as the requested capability.
    #[error("data stored under {key} cannot be coerced to {requested} (stored type is {stored})")]
    TypeMismatch {
        key: String,
        requested: &'static str,
        stored: &'static str,
    },

    /// A list insertion does not conform to the list's established element type.
    #[error("list {key} does not conform to {actual} (element type is {expected})")]
    ListTypeConformance {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },
}

impl StateError {
    /// The cause of this error, without its payload.
    pub fn kind(&self) -> StateErrorKind {
        match self {
            Self::DuplicateName { .. } => StateErrorKind::DuplicateName,
            Self::UnknownName { .. } => StateErrorKind::UnknownName,
            Self::TypeMismatch { .. } => StateErrorKind::TypeMismatch,
            Self::ListTypeConformance { .. } => StateErrorKind::ListTypeConformance,
        }
    }

    /// The key the failed operation targeted.
    pub fn key(&self) -> &str {
        match self {
            Self::DuplicateName { key }
            | Self::UnknownName { key }
            | Self::TypeMismatch { key, .. }
            | Self::ListTypeConformance { key, .. } => key,
        }
    }
}

/// Payload-free discriminant of [`StateError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateErrorKind {
    DuplicateName,
    UnknownName,
    TypeMismatch,
    ListTypeConformance,
}

impl fmt::Display for StateErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DuplicateName => "duplicate-name",
            Self::UnknownName => "unknown-name",
            Self::TypeMismatch => "type-mismatch",
            Self::ListTypeConformance => "list-type-conformance",
        };
        f.write_str(name)
    }
}

/// Result alias for typed state store operations.
pub type StateResult<T> = Result<T, StateError>;
