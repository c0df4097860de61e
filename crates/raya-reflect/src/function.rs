//! Function descriptors
//!
//! Functions are built from closures. Member functions take `&mut T` as their
//! first parameter, static functions take only their arguments. Arguments are
//! converted from [`Value`] with [`FromValue`] and results with `Into<Value>`.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use crate::error::{ReflectError, ReflectResult};
use crate::tags::TagHolder;
use crate::value::{FromValue, Value, ValueKind, ValueType};

/// Type-erased call: instance, arguments
pub type CallFn = Arc<dyn Fn(&mut dyn Any, Vec<Value>) -> ReflectResult<Value> + Send + Sync>;

/// Kind of a reflected function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// Called on an instance of the declaring class
    Method,
    /// Called without an instance
    Static,
}

/// Binding policies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// The returned value is a copy owned by the caller
    ReturnCopy,
    /// The returned value refers to data owned by the instance
    ReturnInternalRef,
    /// The result is dropped and the call yields `Value::Nothing`
    Discard,
}

/// Reflected function of a class
#[derive(Clone)]
pub struct Function {
    name: String,
    owner: String,
    kind: FunctionKind,
    params: Vec<Option<ValueKind>>,
    return_kind: Option<ValueKind>,
    policies: Vec<Policy>,
    callable: CallFn,
    tags: TagHolder,
}

impl Function {
    /// Function from a raw type-erased callable
    pub fn from_raw(
        name: impl Into<String>,
        kind: FunctionKind,
        params: Vec<Option<ValueKind>>,
        return_kind: Option<ValueKind>,
        callable: CallFn,
    ) -> Self {
        Self {
            name: name.into(),
            owner: String::new(),
            kind,
            params,
            return_kind,
            policies: Vec::new(),
            callable,
            tags: TagHolder::new(),
        }
    }

    /// Member function from a closure over `&mut T`
    pub fn method<T, Args, F>(name: impl Into<String>, function: F) -> Self
    where
        F: IntoMethod<T, Args>,
    {
        function.into_function(name.into())
    }

    /// Static function from a closure
    pub fn static_fn<Args, F>(name: impl Into<String>, function: F) -> Self
    where
        F: IntoStaticFunction<Args>,
    {
        function.into_function(name.into())
    }

    /// Attach binding policies
    pub fn with_policies(mut self, policies: impl IntoIterator<Item = Policy>) -> Self {
        self.policies.extend(policies);
        self
    }

    /// Function name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the class that declared this function
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Method or static
    pub fn kind(&self) -> FunctionKind {
        self.kind
    }

    /// Number of declared parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Parameter kinds (`None` accepts any value)
    pub fn params(&self) -> &[Option<ValueKind>] {
        &self.params
    }

    /// Return kind (`None` for dynamic values)
    pub fn return_kind(&self) -> Option<ValueKind> {
        self.return_kind
    }

    /// Binding policies
    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    /// Whether `policy` was attached
    pub fn has_policy(&self, policy: Policy) -> bool {
        self.policies.contains(&policy)
    }

    /// Tags attached to this function
    pub fn tags(&self) -> &TagHolder {
        &self.tags
    }

    /// Invoke. For methods `instance` must be of the declaring type; static
    /// functions ignore it.
    pub fn call(&self, instance: &mut dyn Any, args: Vec<Value>) -> ReflectResult<Value> {
        if args.len() != self.params.len() {
            return Err(ReflectError::ArgumentCount {
                function: self.name.clone(),
                expected: self.params.len(),
                actual: args.len(),
            });
        }
        let result = (self.callable)(instance, args)?;
        if self.has_policy(Policy::Discard) {
            return Ok(Value::Nothing);
        }
        Ok(result)
    }

    /// Invoke a static function
    pub fn call_static(&self, args: Vec<Value>) -> ReflectResult<Value> {
        self.call(&mut (), args)
    }

    pub(crate) fn set_owner(&mut self, owner: &str) {
        self.owner = owner.to_string();
    }

    pub(crate) fn tags_mut(&mut self) -> &mut TagHolder {
        &mut self.tags
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("kind", &self.kind)
            .field("params", &self.params)
            .field("return_kind", &self.return_kind)
            .field("policies", &self.policies)
            .field("tags", &self.tags)
            .finish()
    }
}

/// Closures usable as member functions of `T`
pub trait IntoMethod<T, Args> {
    /// Build the descriptor
    fn into_function(self, name: String) -> Function;
}

/// Closures usable as static functions
pub trait IntoStaticFunction<Args> {
    /// Build the descriptor
    fn into_function(self, name: String) -> Function;
}

macro_rules! impl_into_function {
    ($($arg:ident),*) => {
        impl<T, F, R, $($arg,)*> IntoMethod<T, ($($arg,)*)> for F
        where
            T: Any,
            F: Fn(&mut T, $($arg),*) -> R + Send + Sync + 'static,
            R: Into<Value> + ValueType,
            $($arg: FromValue,)*
        {
            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn into_function(self, name: String) -> Function {
                let callable: CallFn = Arc::new(move |instance: &mut dyn Any, args: Vec<Value>| {
                    let object = instance
                        .downcast_mut::<T>()
                        .ok_or_else(|| ReflectError::TypeMismatch(type_name::<T>().to_string()))?;
                    let mut args = args.into_iter();
                    $(let $arg = $arg::from_value(args.next().unwrap_or_default())?;)*
                    Ok(self(object, $($arg),*).into())
                });
                Function::from_raw(
                    name,
                    FunctionKind::Method,
                    vec![$(<$arg as ValueType>::KIND),*],
                    R::KIND,
                    callable,
                )
            }
        }

        impl<F, R, $($arg,)*> IntoStaticFunction<($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> R + Send + Sync + 'static,
            R: Into<Value> + ValueType,
            $($arg: FromValue,)*
        {
            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn into_function(self, name: String) -> Function {
                let callable: CallFn = Arc::new(move |_instance: &mut dyn Any, args: Vec<Value>| {
                    let mut args = args.into_iter();
                    $(let $arg = $arg::from_value(args.next().unwrap_or_default())?;)*
                    Ok(self($($arg),*).into())
                });
                Function::from_raw(
                    name,
                    FunctionKind::Static,
                    vec![$(<$arg as ValueType>::KIND),*],
                    R::KIND,
                    callable,
                )
            }
        }
    };
}

impl_into_function!();
impl_into_function!(A1);
impl_into_function!(A1, A2);
impl_into_function!(A1, A2, A3);
impl_into_function!(A1, A2, A3, A4);
