//! Constructor descriptors

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::ReflectResult;
use crate::value::{FromValue, Value, ValueKind, ValueType};

/// Type-erased factory
pub type CreateFn = Arc<dyn Fn(Vec<Value>) -> ReflectResult<Box<dyn Any>> + Send + Sync>;

/// Check that every argument converts to its parameter type
pub type AcceptFn = fn(&[Value]) -> bool;

/// One way of constructing instances of a class
#[derive(Clone)]
pub struct Constructor {
    params: Vec<Option<ValueKind>>,
    accepts: AcceptFn,
    create: CreateFn,
}

impl Constructor {
    /// Constructor from a closure producing `T`
    pub fn new<T, Args, F>(factory: F) -> Self
    where
        F: IntoConstructor<T, Args>,
    {
        factory.into_constructor()
    }

    /// Parameter kinds (`None` accepts any value)
    pub fn params(&self) -> &[Option<ValueKind>] {
        &self.params
    }

    /// Whether every argument converts to its parameter, range included
    pub fn matches(&self, args: &[Value]) -> bool {
        args.len() == self.params.len() && (self.accepts)(args)
    }

    /// Create an instance. Callers check [`Constructor::matches`] first.
    pub fn create(&self, args: Vec<Value>) -> ReflectResult<Box<dyn Any>> {
        (self.create)(args)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("params", &self.params)
            .finish()
    }
}

/// Closures usable as constructors of `T`
pub trait IntoConstructor<T, Args> {
    /// Build the descriptor
    fn into_constructor(self) -> Constructor;
}

macro_rules! impl_into_constructor {
    ($($arg:ident),*) => {
        impl<T, F, $($arg,)*> IntoConstructor<T, ($($arg,)*)> for F
        where
            T: Any,
            F: Fn($($arg),*) -> T + Send + Sync + 'static,
            $($arg: FromValue,)*
        {
            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn into_constructor(self) -> Constructor {
                let accepts: AcceptFn = |args: &[Value]| {
                    let mut args = args.iter();
                    true $(&& args.next().is_some_and(|arg| $arg::accepts_value(arg)))*
                };
                let create: CreateFn = Arc::new(move |args: Vec<Value>| {
                    let mut args = args.into_iter();
                    $(let $arg = $arg::from_value(args.next().unwrap_or_default())?;)*
                    Ok(Box::new(self($($arg),*)) as Box<dyn Any>)
                });
                Constructor {
                    params: vec![$(<$arg as ValueType>::KIND),*],
                    accepts,
                    create,
                }
            }
        }
    };
}

impl_into_constructor!();
impl_into_constructor!(A1);
impl_into_constructor!(A1, A2);
impl_into_constructor!(A1, A2, A3);
impl_into_constructor!(A1, A2, A3, A4);
