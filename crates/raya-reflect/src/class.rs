//! Metaclasses
//!
//! A [`Class`] describes one native type: its properties and functions
//! (including those merged in from its bases), its base links, its
//! constructors and its own tags. Classes are built by a
//! [`ClassBuilder`](crate::ClassBuilder) session and are immutable once
//! registered.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::constructor::Constructor;
use crate::error::{ReflectError, ReflectResult};
use crate::function::{Function, FunctionKind};
use crate::property::Property;
use crate::table::NameTable;
use crate::tags::{TagHolder, TagId};
use crate::value::Value;

/// Properties of a class, indexed by name
pub type PropertyTable = NameTable<String, Arc<Property>>;

/// Functions of a class, indexed by name
pub type FunctionTable = NameTable<String, Arc<Function>>;

/// Access to the base part of a derived instance
pub trait Upcast: Send + Sync {
    /// Base part of `instance`, or `None` if `instance` is not of the derived type
    fn upcast<'a>(&self, instance: &'a dyn Any) -> Option<&'a dyn Any>;

    /// Mutable base part of `instance`
    fn upcast_mut<'a>(&self, instance: &'a mut dyn Any) -> Option<&'a mut dyn Any>;
}

/// [`Upcast`] through a pair of field accessors
pub struct FieldUpcast<D, B, F, G> {
    get: F,
    get_mut: G,
    _marker: PhantomData<fn(&D) -> &B>,
}

impl<D, B, F, G> FieldUpcast<D, B, F, G>
where
    D: Any,
    B: Any,
    F: Fn(&D) -> &B + Send + Sync,
    G: Fn(&mut D) -> &mut B + Send + Sync,
{
    /// Wrap the accessors
    pub fn new(get: F, get_mut: G) -> Self {
        Self {
            get,
            get_mut,
            _marker: PhantomData,
        }
    }
}

impl<D, B, F, G> Upcast for FieldUpcast<D, B, F, G>
where
    D: Any,
    B: Any,
    F: Fn(&D) -> &B + Send + Sync,
    G: Fn(&mut D) -> &mut B + Send + Sync,
{
    fn upcast<'a>(&self, instance: &'a dyn Any) -> Option<&'a dyn Any> {
        let derived = instance.downcast_ref::<D>()?;
        Some((self.get)(derived))
    }

    fn upcast_mut<'a>(&self, instance: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        let derived = instance.downcast_mut::<D>()?;
        Some((self.get_mut)(derived))
    }
}

/// Link from a derived class to one of its direct bases
#[derive(Clone)]
pub struct BaseLink {
    base: Arc<Class>,
    upcast: Arc<dyn Upcast>,
}

impl BaseLink {
    /// Create a link to `base` reached through `upcast`
    pub fn new(base: Arc<Class>, upcast: impl Upcast + 'static) -> Self {
        Self {
            base,
            upcast: Arc::new(upcast),
        }
    }

    /// The base class
    pub fn base(&self) -> &Arc<Class> {
        &self.base
    }

    /// Base part of a derived instance
    pub fn upcast<'a>(&self, instance: &'a dyn Any) -> Option<&'a dyn Any> {
        self.upcast.upcast(instance)
    }

    /// Mutable base part of a derived instance
    pub fn upcast_mut<'a>(&self, instance: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        self.upcast.upcast_mut(instance)
    }

    /// Distance in bytes between `instance` and its base part.
    ///
    /// Zero when the base is laid out first. Only addresses are compared.
    pub fn layout_offset(&self, instance: &dyn Any) -> Option<isize> {
        let base = self.upcast(instance)?;
        let base_addr = base as *const dyn Any as *const u8 as usize;
        let derived_addr = instance as *const dyn Any as *const u8 as usize;
        Some(base_addr as isize - derived_addr as isize)
    }
}

impl fmt::Debug for BaseLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseLink")
            .field("base", &self.base.name())
            .finish()
    }
}

/// Reflection metadata for a single native type
#[derive(Debug)]
pub struct Class {
    pub(crate) name: String,
    pub(crate) type_id: TypeId,
    pub(crate) type_name: &'static str,
    pub(crate) bases: Vec<BaseLink>,
    pub(crate) properties: PropertyTable,
    pub(crate) functions: FunctionTable,
    pub(crate) constructors: Vec<Constructor>,
    pub(crate) tags: TagHolder,
}

impl Class {
    /// Empty class describing `T`
    pub fn new<T: Any>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            bases: Vec::new(),
            properties: PropertyTable::new(),
            functions: FunctionTable::new(),
            constructors: Vec::new(),
            tags: TagHolder::new(),
        }
    }

    /// Class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identity of the described type
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Rust name of the described type
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Register a direct base
    pub(crate) fn add_base(&mut self, link: BaseLink) -> ReflectResult<()> {
        if self.base(link.base.name()).is_some() {
            return Err(ReflectError::DuplicateBase {
                class: self.name.clone(),
                base: link.base.name().to_string(),
            });
        }
        self.bases.push(link);
        Ok(())
    }

    /// Direct bases in declaration order
    pub fn bases(&self) -> &[BaseLink] {
        &self.bases
    }

    /// Direct base named `name`
    pub fn base(&self, name: &str) -> Option<&BaseLink> {
        self.bases.iter().find(|link| link.base.name() == name)
    }

    /// Number of direct bases
    pub fn base_count(&self) -> usize {
        self.bases.len()
    }

    /// Whether `name` is a direct or indirect base
    pub fn is_derived_from(&self, name: &str) -> bool {
        self.bases.iter().any(|link| link.base.is_a(name))
    }

    fn is_a(&self, name: &str) -> bool {
        self.name == name || self.is_derived_from(name)
    }

    /// Properties, own and inherited, in declaration order
    pub fn properties(&self) -> &PropertyTable {
        &self.properties
    }

    /// Functions, own and inherited, in declaration order
    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    /// Property by name
    pub fn property(&self, name: &str) -> Option<&Arc<Property>> {
        self.properties.get(name)
    }

    /// Function by name
    pub fn function(&self, name: &str) -> Option<&Arc<Function>> {
        self.functions.get(name)
    }

    /// Whether a property named `name` exists
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains(name)
    }

    /// Whether a function named `name` exists
    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains(name)
    }

    /// Constructors in declaration order
    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    /// Tags attached to the class itself
    pub fn tags(&self) -> &TagHolder {
        &self.tags
    }

    /// View `instance` (of this class) as its part of class `base_name`.
    ///
    /// Returns `instance` itself when `base_name` is this class, `None` when
    /// `base_name` is not an ancestor or the instance has the wrong type.
    pub fn upcast<'a>(&self, instance: &'a dyn Any, base_name: &str) -> Option<&'a dyn Any> {
        if self.name == base_name {
            return Some(instance);
        }
        let link = self.bases.iter().find(|link| link.base.is_a(base_name))?;
        link.base.upcast(link.upcast(instance)?, base_name)
    }

    /// Mutable counterpart of [`Class::upcast`]
    pub fn upcast_mut<'a>(
        &self,
        instance: &'a mut dyn Any,
        base_name: &str,
    ) -> Option<&'a mut dyn Any> {
        if self.name == base_name {
            return Some(instance);
        }
        let link = self.bases.iter().find(|link| link.base.is_a(base_name))?;
        link.base.upcast_mut(link.upcast_mut(instance)?, base_name)
    }

    /// Read property `name` of `instance`
    pub fn property_value(&self, name: &str, instance: &dyn Any) -> ReflectResult<Value> {
        let property = self.find_property(name)?;
        property.get(self.owner_part(instance, property.owner())?)
    }

    /// Whether property `name` can be read on `instance`
    pub fn is_property_readable(&self, name: &str, instance: &dyn Any) -> ReflectResult<bool> {
        let property = self.find_property(name)?;
        property.is_readable(self.owner_part(instance, property.owner())?)
    }

    /// Whether property `name` can be written on `instance`
    pub fn is_property_writable(&self, name: &str, instance: &dyn Any) -> ReflectResult<bool> {
        let property = self.find_property(name)?;
        property.is_writable(self.owner_part(instance, property.owner())?)
    }

    /// Resolve tag `id` of property `name` against `instance`
    pub fn property_tag(
        &self,
        name: &str,
        id: &TagId,
        instance: &dyn Any,
    ) -> ReflectResult<Value> {
        let property = self.find_property(name)?;
        property.tags().get_tag(id, self.owner_part(instance, property.owner())?)
    }

    /// Resolve tag `id` of function `name` against `instance`
    pub fn function_tag(
        &self,
        name: &str,
        id: &TagId,
        instance: &dyn Any,
    ) -> ReflectResult<Value> {
        let function = self.find_function(name)?;
        function.tags().get_tag(id, self.owner_part(instance, function.owner())?)
    }

    /// Write property `name` of `instance`
    pub fn set_property_value(
        &self,
        name: &str,
        instance: &mut dyn Any,
        value: Value,
    ) -> ReflectResult<()> {
        let property = self.find_property(name)?;
        let part = self
            .upcast_mut(instance, property.owner())
            .ok_or_else(|| ReflectError::TypeMismatch(self.type_name.to_string()))?;
        property.set(part, value)
    }

    /// Call function `name` on `instance`
    pub fn call(
        &self,
        name: &str,
        instance: &mut dyn Any,
        args: Vec<Value>,
    ) -> ReflectResult<Value> {
        let function = self.find_function(name)?;
        if function.kind() == FunctionKind::Static {
            return function.call_static(args);
        }
        let part = self
            .upcast_mut(instance, function.owner())
            .ok_or_else(|| ReflectError::TypeMismatch(self.type_name.to_string()))?;
        function.call(part, args)
    }

    /// Create an instance with the first constructor matching `args`
    pub fn construct(&self, args: Vec<Value>) -> ReflectResult<Box<dyn Any>> {
        self.constructors
            .iter()
            .find(|ctor| ctor.matches(&args))
            .ok_or_else(|| ReflectError::NoMatchingConstructor(self.name.clone()))?
            .create(args)
    }

    fn find_property(&self, name: &str) -> ReflectResult<&Arc<Property>> {
        self.properties.get(name).ok_or_else(|| ReflectError::PropertyNotFound {
            class: self.name.clone(),
            property: name.to_string(),
        })
    }

    fn find_function(&self, name: &str) -> ReflectResult<&Arc<Function>> {
        self.functions.get(name).ok_or_else(|| ReflectError::FunctionNotFound {
            class: self.name.clone(),
            function: name.to_string(),
        })
    }

    /// Part of `instance` declared by class `owner`
    fn owner_part<'a>(&self, instance: &'a dyn Any, owner: &str) -> ReflectResult<&'a dyn Any> {
        self.upcast(instance, owner)
            .ok_or_else(|| ReflectError::TypeMismatch(self.type_name.to_string()))
    }
}
