//! Constant or per-instance computed values

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use crate::error::{ReflectError, ReflectResult};

/// Function computing a value from a type-erased instance
pub type ComputeFn<V> = Arc<dyn Fn(&dyn Any) -> ReflectResult<V> + Send + Sync>;

/// A value that is either fixed at declaration time or computed from the
/// instance it is read against.
pub enum Getter<V> {
    /// Same value for every instance
    Constant(V),
    /// Evaluated against each instance
    Computed(ComputeFn<V>),
}

impl<V: Clone> Getter<V> {
    /// Wrap a constant
    pub fn constant(value: V) -> Self {
        Getter::Constant(value)
    }

    /// Wrap a function of a concrete instance type.
    ///
    /// Reading it against an instance that is not a `T` fails with
    /// [`ReflectError::TypeMismatch`].
    pub fn computed<T, F>(function: F) -> Self
    where
        T: Any,
        V: 'static,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        Getter::Computed(Arc::new(move |instance: &dyn Any| {
            instance
                .downcast_ref::<T>()
                .map(&function)
                .ok_or_else(|| ReflectError::TypeMismatch(type_name::<T>().to_string()))
        }))
    }

    /// Effective value for `instance`
    pub fn get(&self, instance: &dyn Any) -> ReflectResult<V> {
        match self {
            Getter::Constant(value) => Ok(value.clone()),
            Getter::Computed(function) => function(instance),
        }
    }

    /// Whether the value is fixed for all instances
    pub fn is_constant(&self) -> bool {
        matches!(self, Getter::Constant(_))
    }
}

impl<V: Clone> Clone for Getter<V> {
    fn clone(&self) -> Self {
        match self {
            Getter::Constant(value) => Getter::Constant(value.clone()),
            Getter::Computed(function) => Getter::Computed(Arc::clone(function)),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for Getter<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Getter::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Getter::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}
