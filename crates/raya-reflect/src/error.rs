//! Reflection errors

use crate::tags::TagId;
use crate::value::ValueKind;

/// Errors raised while building or querying metaclasses
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReflectError {
    /// A base class was declared twice on the same class
    #[error("class '{class}' already has '{base}' as a base")]
    DuplicateBase {
        /// Class being built
        class: String,
        /// Base declared twice
        base: String,
    },

    /// A tag was attached twice while the registry rejects duplicates
    #[error("tag {0} is already defined on this holder")]
    DuplicateTag(TagId),

    /// `readable`/`writable` called while the current member is not a property
    #[error("no current property in the declaration of class '{0}'")]
    NoCurrentProperty(String),

    /// A class was referenced before its own session registered it
    #[error("class for type '{0}' is not registered")]
    ClassNotRegistered(String),

    /// A type or class name was registered twice
    #[error("class '{0}' is already registered")]
    ClassAlreadyRegistered(String),

    /// Tag lookup miss
    #[error("tag {0} not found")]
    TagNotFound(TagId),

    /// Property lookup miss
    #[error("property '{property}' not found in class '{class}'")]
    PropertyNotFound {
        /// Class searched
        class: String,
        /// Missing property
        property: String,
    },

    /// Function lookup miss
    #[error("function '{function}' not found in class '{class}'")]
    FunctionNotFound {
        /// Class searched
        class: String,
        /// Missing function
        function: String,
    },

    /// Instance is not of the type a member was declared on
    #[error("instance is not a '{0}'")]
    TypeMismatch(String),

    /// Property is not readable for this instance
    #[error("property '{0}' is not readable")]
    NotReadable(String),

    /// Property is not writable for this instance
    #[error("property '{0}' is not writable")]
    NotWritable(String),

    /// Wrong number of arguments passed to a function
    #[error("function '{function}' expects {expected} arguments, got {actual}")]
    ArgumentCount {
        /// Function name
        function: String,
        /// Declared arity
        expected: usize,
        /// Supplied arguments
        actual: usize,
    },

    /// A value could not be converted to the requested native type
    #[error("cannot convert {actual} value to {expected}")]
    ValueConversion {
        /// Kind the native side expects
        expected: ValueKind,
        /// Kind that was supplied
        actual: ValueKind,
    },

    /// No constructor accepts the supplied arguments
    #[error("no constructor of class '{0}' matches the arguments")]
    NoMatchingConstructor(String),
}

impl ReflectError {
    /// Whether this error reports a misuse of the declaration API rather than
    /// a lookup miss or an access failure at runtime.
    pub fn is_invalid_usage(&self) -> bool {
        matches!(
            self,
            ReflectError::DuplicateBase { .. }
                | ReflectError::DuplicateTag(_)
                | ReflectError::NoCurrentProperty(_)
                | ReflectError::ClassNotRegistered(_)
                | ReflectError::ClassAlreadyRegistered(_)
        )
    }
}

/// Reflection result
pub type ReflectResult<T> = Result<T, ReflectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_usage_classification() {
        assert!(ReflectError::NoCurrentProperty("Point".to_string()).is_invalid_usage());
        assert!(ReflectError::DuplicateTag(TagId::from("color")).is_invalid_usage());
        assert!(!ReflectError::TagNotFound(TagId::from("color")).is_invalid_usage());
        assert!(!ReflectError::NotReadable("x".to_string()).is_invalid_usage());
    }

    #[test]
    fn test_error_messages() {
        let err = ReflectError::DuplicateBase {
            class: "Circle".to_string(),
            base: "Shape".to_string(),
        };
        assert_eq!(err.to_string(), "class 'Circle' already has 'Shape' as a base");

        let err = ReflectError::TagNotFound(TagId::Index(7));
        assert_eq!(err.to_string(), "tag #7 not found");
    }
}
