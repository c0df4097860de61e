//! Property descriptors
//!
//! A [`Property`] wraps a getter (and optionally a setter) over a concrete
//! type behind a type-erased interface, together with its readable/writable
//! predicates and tags.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use crate::error::{ReflectError, ReflectResult};
use crate::getter::{ComputeFn, Getter};
use crate::tags::TagHolder;
use crate::value::{FromValue, Value, ValueKind, ValueType};

/// Setter over a type-erased instance
pub type SetFn = Arc<dyn Fn(&mut dyn Any, Value) -> ReflectResult<()> + Send + Sync>;

/// Reflected property of a class
#[derive(Clone)]
pub struct Property {
    name: String,
    owner: String,
    kind: Option<ValueKind>,
    getter: ComputeFn<Value>,
    setter: Option<SetFn>,
    readable: Getter<bool>,
    writable: Getter<bool>,
    tags: TagHolder,
}

impl Property {
    /// Property read through `getter`, with no setter
    pub fn read_only<T, V, G>(name: impl Into<String>, getter: G) -> Self
    where
        T: Any,
        V: Into<Value> + ValueType,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            owner: String::new(),
            kind: V::KIND,
            getter: Arc::new(move |instance: &dyn Any| {
                let object = instance
                    .downcast_ref::<T>()
                    .ok_or_else(|| ReflectError::TypeMismatch(type_name::<T>().to_string()))?;
                Ok(getter(object).into())
            }),
            setter: None,
            readable: Getter::constant(true),
            writable: Getter::constant(false),
            tags: TagHolder::new(),
        }
    }

    /// Property read through `getter` and written through `setter`
    pub fn read_write<T, V, G, S>(name: impl Into<String>, getter: G, setter: S) -> Self
    where
        T: Any,
        V: Into<Value> + FromValue,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let mut property = Self::read_only(name, getter);
        property.setter = Some(Arc::new(move |instance: &mut dyn Any, value: Value| {
            let object = instance
                .downcast_mut::<T>()
                .ok_or_else(|| ReflectError::TypeMismatch(type_name::<T>().to_string()))?;
            setter(object, V::from_value(value)?);
            Ok(())
        }));
        property.writable = Getter::constant(true);
        property
    }

    /// Property name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the class that declared this property
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Value kind produced by the getter (`None` for dynamic values)
    pub fn kind(&self) -> Option<ValueKind> {
        self.kind
    }

    /// Tags attached to this property
    pub fn tags(&self) -> &TagHolder {
        &self.tags
    }

    /// Whether a setter was supplied
    pub fn has_setter(&self) -> bool {
        self.setter.is_some()
    }

    /// Readable predicate
    pub fn readable(&self) -> &Getter<bool> {
        &self.readable
    }

    /// Writable predicate
    pub fn writable(&self) -> &Getter<bool> {
        &self.writable
    }

    /// Whether the property can be read on `instance`
    pub fn is_readable(&self, instance: &dyn Any) -> ReflectResult<bool> {
        self.readable.get(instance)
    }

    /// Whether the property can be written on `instance`
    pub fn is_writable(&self, instance: &dyn Any) -> ReflectResult<bool> {
        if self.setter.is_none() {
            return Ok(false);
        }
        self.writable.get(instance)
    }

    /// Read the property. `instance` must be of the declaring type.
    pub fn get(&self, instance: &dyn Any) -> ReflectResult<Value> {
        if !self.is_readable(instance)? {
            return Err(ReflectError::NotReadable(self.name.clone()));
        }
        (self.getter)(instance)
    }

    /// Write the property. `instance` must be of the declaring type.
    pub fn set(&self, instance: &mut dyn Any, value: Value) -> ReflectResult<()> {
        let setter = match &self.setter {
            Some(setter) if self.writable.get(&*instance)? => setter,
            _ => return Err(ReflectError::NotWritable(self.name.clone())),
        };
        setter(instance, value)
    }

    pub(crate) fn set_owner(&mut self, owner: &str) {
        self.owner = owner.to_string();
    }

    pub(crate) fn set_readable(&mut self, readable: Getter<bool>) {
        self.readable = readable;
    }

    pub(crate) fn set_writable(&mut self, writable: Getter<bool>) {
        self.writable = writable;
    }

    pub(crate) fn tags_mut(&mut self) -> &mut TagHolder {
        &mut self.tags
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("kind", &self.kind)
            .field("has_setter", &self.has_setter())
            .field("readable", &self.readable)
            .field("writable", &self.writable)
            .field("tags", &self.tags)
            .finish()
    }
}
