//! Class declaration sessions
//!
//! A [`ClassBuilder`] is bound to one class under construction. Each call
//! either adds a member or modifies the member declared last (the "current"
//! member): `tag*` apply to the current property or function, or to the class
//! itself before any member is declared; `readable*`/`writable*` require the
//! current member to be a property.
//!
//! ```rust,ignore
//! registry
//!     .declare::<Circle>("Circle")
//!     .base(|c: &Circle| &c.shape, |c: &mut Circle| &mut c.shape)?
//!     .tag_value("category", "geometry")?
//!     .property_rw("radius", |c: &Circle| c.radius, |c: &mut Circle, r: f64| c.radius = r)
//!     .writable_with(|c: &Circle| !c.locked)?
//!     .function("area", |c: &mut Circle| std::f64::consts::PI * c.radius * c.radius)
//!     .constructor(|r: f64| Circle::new(r))
//!     .register()?;
//! ```
//!
//! Declare bases first. A member the class declares itself is never replaced
//! by an inherited one under the default [`InheritPolicy::KeepDeclared`]. If a
//! base does replace the current member, the class becomes current again.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::class::{BaseLink, Class, FieldUpcast};
use crate::config::InheritPolicy;
use crate::constructor::{Constructor, IntoConstructor};
use crate::error::{ReflectError, ReflectResult};
use crate::function::{Function, IntoMethod, IntoStaticFunction, Policy};
use crate::getter::Getter;
use crate::property::Property;
use crate::registry::ClassRegistry;
use crate::table::NameTable;
use crate::tags::{TagHolder, TagId};
use crate::value::{FromValue, Value, ValueType};

/// Source of properties and functions defined outside the builder session,
/// e.g. generated bindings.
pub trait ExternalMapper<T> {
    /// Properties to add
    fn properties(&self) -> Vec<Property>;

    /// Functions to add
    fn functions(&self) -> Vec<Function> {
        Vec::new()
    }
}

/// Member that `tag`, `readable` and `writable` apply to
#[derive(Debug, Clone, PartialEq, Eq)]
enum Current {
    Class,
    Property(String),
    Function(String),
}

/// Declaration session for the class describing `T`
pub struct ClassBuilder<'r, T: Any> {
    registry: &'r mut ClassRegistry,
    class: Class,
    current: Current,
    _marker: PhantomData<fn() -> T>,
}

impl<'r, T: Any> ClassBuilder<'r, T> {
    pub(crate) fn new(registry: &'r mut ClassRegistry, name: impl Into<String>) -> Self {
        Self {
            registry,
            class: Class::new::<T>(name),
            current: Current::Class,
            _marker: PhantomData,
        }
    }

    /// The class as declared so far
    pub fn class(&self) -> &Class {
        &self.class
    }

    /// Declare `B` as a direct base, reached through the given accessors.
    ///
    /// `B` must already be registered. Its current properties and functions
    /// are merged into this class.
    pub fn base<B, F, G>(mut self, get: F, get_mut: G) -> ReflectResult<Self>
    where
        B: Any,
        F: Fn(&T) -> &B + Send + Sync + 'static,
        G: Fn(&mut T) -> &mut B + Send + Sync + 'static,
    {
        let base = self.registry.class_by_type::<B>()?;
        self.class
            .add_base(BaseLink::new(Arc::clone(&base), FieldUpcast::new(get, get_mut)))?;
        tracing::debug!(class = %self.class.name, base = %base.name(), "declared base");

        let policy = self.registry.config().inherit_policy;
        let class_name = self.class.name.clone();
        merge_inherited(&mut self.class.properties, base.properties(), &class_name, policy, |p| {
            p.owner()
        });
        merge_inherited(&mut self.class.functions, base.functions(), &class_name, policy, |f| {
            f.owner()
        });
        if !self.current_is_own() {
            tracing::trace!(class = %class_name, "current member replaced by inherited one");
            self.current = Current::Class;
        }
        Ok(self)
    }

    /// Declare a read-only property
    pub fn property<V, G>(self, name: impl Into<String>, getter: G) -> Self
    where
        V: Into<Value> + ValueType,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.add_property(Property::read_only(name, getter))
    }

    /// Declare a read-write property
    pub fn property_rw<V, G, S>(self, name: impl Into<String>, getter: G, setter: S) -> Self
    where
        V: Into<Value> + FromValue,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.add_property(Property::read_write(name, getter, setter))
    }

    /// Declare a member function
    pub fn function<Args, F>(self, name: impl Into<String>, function: F) -> Self
    where
        F: IntoMethod<T, Args>,
    {
        self.add_function(Function::method(name, function))
    }

    /// Declare a member function with binding policies
    pub fn function_with<Args, F>(
        self,
        name: impl Into<String>,
        function: F,
        policies: impl IntoIterator<Item = Policy>,
    ) -> Self
    where
        F: IntoMethod<T, Args>,
    {
        self.add_function(Function::method(name, function).with_policies(policies))
    }

    /// Declare a static function
    pub fn static_function<Args, F>(self, name: impl Into<String>, function: F) -> Self
    where
        F: IntoStaticFunction<Args>,
    {
        self.add_function(Function::static_fn(name, function))
    }

    /// Attach a tag without a value to the current member
    pub fn tag(self, id: impl Into<TagId>) -> ReflectResult<Self> {
        self.set_tag(id.into(), Getter::constant(Value::Nothing))
    }

    /// Attach a tag with a constant value to the current member
    pub fn tag_value(self, id: impl Into<TagId>, value: impl Into<Value>) -> ReflectResult<Self> {
        self.set_tag(id.into(), Getter::constant(value.into()))
    }

    /// Attach a tag computed from each instance to the current member
    pub fn tag_with<V, F>(self, id: impl Into<TagId>, function: F) -> ReflectResult<Self>
    where
        V: Into<Value>,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        let getter = Getter::computed(move |object: &T| -> Value { function(object).into() });
        self.set_tag(id.into(), getter)
    }

    /// Make the current property readable or not
    pub fn readable(mut self, readable: bool) -> ReflectResult<Self> {
        self.current_property()?.set_readable(Getter::constant(readable));
        Ok(self)
    }

    /// Make the current property readable depending on the instance
    pub fn readable_with<F>(mut self, predicate: F) -> ReflectResult<Self>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.current_property()?.set_readable(Getter::computed(predicate));
        Ok(self)
    }

    /// Make the current property writable or not
    pub fn writable(mut self, writable: bool) -> ReflectResult<Self> {
        self.current_property()?.set_writable(Getter::constant(writable));
        Ok(self)
    }

    /// Make the current property writable depending on the instance
    pub fn writable_with<F>(mut self, predicate: F) -> ReflectResult<Self>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.current_property()?.set_writable(Getter::computed(predicate));
        Ok(self)
    }

    /// Declare a constructor
    pub fn constructor<Args, F>(mut self, factory: F) -> Self
    where
        F: IntoConstructor<T, Args>,
    {
        self.class.constructors.push(Constructor::new(factory));
        self
    }

    /// Add the members provided by `mapper`
    pub fn external<M: ExternalMapper<T>>(mut self, mapper: M) -> Self {
        for property in mapper.properties() {
            self = self.add_property(property);
        }
        for function in mapper.functions() {
            self = self.add_function(function);
        }
        self
    }

    /// End the session and store the class in the registry
    pub fn register(self) -> ReflectResult<Arc<Class>> {
        self.registry.register(self.class)
    }

    fn add_property(mut self, mut property: Property) -> Self {
        property.set_owner(&self.class.name);
        let name = property.name().to_string();
        if self.class.properties.insert(name.clone(), Arc::new(property)).is_some() {
            tracing::trace!(class = %self.class.name, property = %name, "replaced property");
        }
        self.current = Current::Property(name);
        self
    }

    fn add_function(mut self, mut function: Function) -> Self {
        function.set_owner(&self.class.name);
        let name = function.name().to_string();
        if self.class.functions.insert(name.clone(), Arc::new(function)).is_some() {
            tracing::trace!(class = %self.class.name, function = %name, "replaced function");
        }
        self.current = Current::Function(name);
        self
    }

    fn set_tag(mut self, id: TagId, value: Getter<Value>) -> ReflectResult<Self> {
        let policy = self.registry.config().tag_policy;
        self.current_tags()?.set_tag(id, value, policy)?;
        Ok(self)
    }

    /// Whether the current member is still declared by this class
    fn current_is_own(&self) -> bool {
        let class = &self.class;
        match &self.current {
            Current::Class => true,
            Current::Property(name) => class
                .properties
                .get(name.as_str())
                .is_some_and(|p| p.owner() == class.name),
            Current::Function(name) => class
                .functions
                .get(name.as_str())
                .is_some_and(|f| f.owner() == class.name),
        }
    }

    fn current_tags(&mut self) -> ReflectResult<&mut TagHolder> {
        let class = &mut self.class;
        match &self.current {
            Current::Class => Ok(&mut class.tags),
            Current::Property(name) => class
                .properties
                .get_mut(name.as_str())
                .map(|p| Arc::make_mut(p).tags_mut())
                .ok_or_else(|| ReflectError::PropertyNotFound {
                    class: class.name.clone(),
                    property: name.clone(),
                }),
            Current::Function(name) => class
                .functions
                .get_mut(name.as_str())
                .map(|f| Arc::make_mut(f).tags_mut())
                .ok_or_else(|| ReflectError::FunctionNotFound {
                    class: class.name.clone(),
                    function: name.clone(),
                }),
        }
    }

    fn current_property(&mut self) -> ReflectResult<&mut Property> {
        let class = &mut self.class;
        let Current::Property(name) = &self.current else {
            return Err(ReflectError::NoCurrentProperty(class.name.clone()));
        };
        class
            .properties
            .get_mut(name.as_str())
            .map(Arc::make_mut)
            .ok_or_else(|| ReflectError::PropertyNotFound {
                class: class.name.clone(),
                property: name.clone(),
            })
    }
}

/// Copy the members of a base table into a derived one
fn merge_inherited<M>(
    target: &mut NameTable<String, Arc<M>>,
    inherited: &NameTable<String, Arc<M>>,
    class_name: &str,
    policy: InheritPolicy,
    owner: impl Fn(&M) -> &str,
) {
    for (name, member) in inherited.iter() {
        let declared_here = target
            .get(name.as_str())
            .is_some_and(|existing| owner(existing) == class_name);
        if declared_here && policy == InheritPolicy::KeepDeclared {
            tracing::trace!(class = %class_name, member = %name, "kept own declaration over inherited");
            continue;
        }
        target.insert_entry((name, member));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RegistryConfig, TagPolicy};

    #[derive(Default)]
    struct Animal {
        name: String,
        legs: i64,
    }

    #[derive(Default)]
    struct Dog {
        animal: Animal,
        good: bool,
    }

    fn register_animal(registry: &mut ClassRegistry) -> Arc<Class> {
        registry
            .declare::<Animal>("Animal")
            .property_rw("name", |a: &Animal| a.name.clone(), |a: &mut Animal, v: String| a.name = v)
            .property("legs", |a: &Animal| a.legs)
            .function("describe", |a: &mut Animal| format!("{} has {} legs", a.name, a.legs))
            .register()
            .unwrap()
    }

    fn dog_base(builder: ClassBuilder<'_, Dog>) -> ReflectResult<ClassBuilder<'_, Dog>> {
        builder.base(|d: &Dog| &d.animal, |d: &mut Dog| &mut d.animal)
    }

    #[test]
    fn test_class_tags_before_any_member() {
        let mut registry = ClassRegistry::new();
        let class = registry
            .declare::<Animal>("Animal")
            .tag("entity")
            .unwrap()
            .tag_value("table", "animals")
            .unwrap()
            .register()
            .unwrap();

        assert!(class.tags().has_tag(&"entity".into()));
        assert_eq!(
            class.tags().get_tag(&"table".into(), &Animal::default()),
            Ok(Value::from("animals"))
        );
    }

    #[test]
    fn test_tags_follow_current_member() {
        let mut registry = ClassRegistry::new();
        let class = registry
            .declare::<Animal>("Animal")
            .property("legs", |a: &Animal| a.legs)
            .tag_value("min", 0)
            .unwrap()
            .function("describe", |a: &mut Animal| a.name.clone())
            .tag("script")
            .unwrap()
            .register()
            .unwrap();

        let legs = class.property("legs").unwrap();
        assert!(legs.tags().has_tag(&"min".into()));
        assert!(!legs.tags().has_tag(&"script".into()));
        assert!(class.function("describe").unwrap().tags().has_tag(&"script".into()));
        assert_eq!(class.tags().tag_count(), 0);
    }

    #[test]
    fn test_computed_tag() {
        let mut registry = ClassRegistry::new();
        let class = registry
            .declare::<Animal>("Animal")
            .tag_with("label", |a: &Animal| format!("animal:{}", a.name))
            .unwrap()
            .register()
            .unwrap();

        let rex = Animal { name: "rex".to_string(), legs: 4 };
        assert_eq!(
            class.tags().get_tag(&"label".into(), &rex),
            Ok(Value::from("animal:rex"))
        );
    }

    #[test]
    fn test_readable_requires_property() {
        let mut registry = ClassRegistry::new();
        let err = registry
            .declare::<Animal>("Animal")
            .readable(false)
            .err()
            .unwrap();
        assert_eq!(err, ReflectError::NoCurrentProperty("Animal".to_string()));
        assert!(err.is_invalid_usage());
    }

    #[test]
    fn test_current_target_switches_to_function() {
        let mut registry = ClassRegistry::new();
        let builder = registry
            .declare::<Animal>("Animal")
            .property("legs", |a: &Animal| a.legs)
            .readable(false)
            .unwrap()
            .function("describe", |a: &mut Animal| a.name.clone());

        let err = builder.writable(false).err().unwrap();
        assert_eq!(err, ReflectError::NoCurrentProperty("Animal".to_string()));
    }

    #[test]
    fn test_readable_writable_predicates() {
        let mut registry = ClassRegistry::new();
        let class = registry
            .declare::<Animal>("Animal")
            .property_rw("legs", |a: &Animal| a.legs, |a: &mut Animal, v: i64| a.legs = v)
            .readable_with(|a: &Animal| !a.name.is_empty())
            .unwrap()
            .writable(false)
            .unwrap()
            .register()
            .unwrap();

        let legs = class.property("legs").unwrap();
        assert_eq!(legs.is_readable(&Animal::default()), Ok(false));
        let named = Animal { name: "cat".to_string(), legs: 4 };
        assert_eq!(legs.get(&named), Ok(Value::Int(4)));
        assert_eq!(legs.is_writable(&named), Ok(false));
    }

    #[test]
    fn test_base_flattens_members() {
        let mut registry = ClassRegistry::new();
        let animal = register_animal(&mut registry);

        let dog = dog_base(registry.declare::<Dog>("Dog"))
            .unwrap()
            .property("good", |d: &Dog| d.good)
            .register()
            .unwrap();

        assert_eq!(dog.base_count(), 1);
        let names: Vec<&str> = dog.properties().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["name", "legs", "good"]);
        assert!(dog.has_function("describe"));
        assert!(Arc::ptr_eq(
            dog.property("legs").unwrap(),
            animal.property("legs").unwrap()
        ));
        assert_eq!(dog.property("legs").unwrap().owner(), "Animal");
        assert_eq!(dog.property("good").unwrap().owner(), "Dog");
    }

    #[test]
    fn test_derived_redeclaration_overrides_inherited() {
        let mut registry = ClassRegistry::new();
        let animal = register_animal(&mut registry);

        let dog = dog_base(registry.declare::<Dog>("Dog"))
            .unwrap()
            .property("legs", |_: &Dog| 4i64)
            .register()
            .unwrap();

        assert_eq!(dog.properties().len(), animal.properties().len());
        assert_eq!(dog.property("legs").unwrap().owner(), "Dog");

        let three_legged = Dog {
            animal: Animal { name: "tripod".to_string(), legs: 3 },
            good: true,
        };
        assert_eq!(dog.property_value("legs", &three_legged), Ok(Value::Int(4)));
        assert_eq!(
            dog.property_value("name", &three_legged),
            Ok(Value::from("tripod"))
        );
    }

    #[test]
    fn test_declared_before_base_is_kept() {
        let mut registry = ClassRegistry::new();
        register_animal(&mut registry);

        let builder = registry
            .declare::<Dog>("Dog")
            .property("legs", |_: &Dog| 4i64);
        let dog = dog_base(builder).unwrap().register().unwrap();

        assert_eq!(dog.property("legs").unwrap().owner(), "Dog");
    }

    #[test]
    fn test_replace_policy_lets_base_win() {
        let config = RegistryConfig::new().inherit_policy(InheritPolicy::Replace);
        let mut registry = ClassRegistry::with_config(config);
        register_animal(&mut registry);

        let builder = registry
            .declare::<Dog>("Dog")
            .property("legs", |_: &Dog| 4i64);
        let dog = dog_base(builder).unwrap().register().unwrap();

        assert_eq!(dog.property("legs").unwrap().owner(), "Animal");
    }

    #[test]
    fn test_replaced_current_member_is_released() {
        let config = RegistryConfig::new().inherit_policy(InheritPolicy::Replace);
        let mut registry = ClassRegistry::with_config(config);
        register_animal(&mut registry);

        let builder = registry
            .declare::<Dog>("Dog")
            .property("legs", |_: &Dog| 4i64);
        let err = dog_base(builder)
            .unwrap()
            .readable_with(|d: &Dog| d.good)
            .err()
            .unwrap();
        assert_eq!(err, ReflectError::NoCurrentProperty("Dog".to_string()));
    }

    #[test]
    fn test_tag_after_replacing_base_goes_to_class() {
        let config = RegistryConfig::new().inherit_policy(InheritPolicy::Replace);
        let mut registry = ClassRegistry::with_config(config);
        let animal = register_animal(&mut registry);

        let builder = registry
            .declare::<Dog>("Dog")
            .function("describe", |_: &mut Dog| "dog".to_string());
        let dog = dog_base(builder)
            .unwrap()
            .tag_with("kind", |d: &Dog| d.good)
            .unwrap()
            .register()
            .unwrap();

        let describe = dog.function("describe").unwrap();
        assert!(Arc::ptr_eq(describe, animal.function("describe").unwrap()));
        assert!(!describe.tags().has_tag(&"kind".into()));
        let rex = Dog { animal: Animal { name: "rex".to_string(), legs: 4 }, good: true };
        assert_eq!(dog.tags().get_tag(&"kind".into(), &rex), Ok(Value::Bool(true)));
        assert_eq!(dog.property_value("legs", &rex), Ok(Value::Int(4)));
    }

    #[test]
    fn test_kept_current_member_stays_current() {
        let mut registry = ClassRegistry::new();
        register_animal(&mut registry);

        let builder = registry
            .declare::<Dog>("Dog")
            .property("legs", |_: &Dog| 4i64);
        let dog = dog_base(builder)
            .unwrap()
            .readable(false)
            .unwrap()
            .register()
            .unwrap();

        assert_eq!(dog.property("legs").unwrap().is_readable(&Dog::default()), Ok(false));
    }

    #[test]
    fn test_duplicate_base() {
        let mut registry = ClassRegistry::new();
        register_animal(&mut registry);

        let builder = dog_base(registry.declare::<Dog>("Dog")).unwrap();
        let err = dog_base(builder).err().unwrap();
        assert_eq!(
            err,
            ReflectError::DuplicateBase {
                class: "Dog".to_string(),
                base: "Animal".to_string(),
            }
        );
    }

    #[test]
    fn test_unregistered_base_fails() {
        let mut registry = ClassRegistry::new();
        let err = dog_base(registry.declare::<Dog>("Dog")).err().unwrap();
        assert!(matches!(err, ReflectError::ClassNotRegistered(name) if name.ends_with("Animal")));
    }

    #[test]
    fn test_duplicate_tag_policies() {
        let mut registry = ClassRegistry::new();
        let class = registry
            .declare::<Animal>("Animal")
            .tag_value("v", 1)
            .unwrap()
            .tag_value("v", 2)
            .unwrap()
            .register()
            .unwrap();
        assert_eq!(class.tags().get_tag(&"v".into(), &()), Ok(Value::Int(2)));

        let mut strict = ClassRegistry::with_config(RegistryConfig::new().tag_policy(TagPolicy::Reject));
        let err = strict
            .declare::<Animal>("Animal")
            .tag_value("v", 1)
            .unwrap()
            .tag_value("v", 2)
            .err()
            .unwrap();
        assert_eq!(err, ReflectError::DuplicateTag(TagId::from("v")));
    }

    #[test]
    fn test_tagging_inherited_property_does_not_touch_base() {
        let mut registry = ClassRegistry::new();
        let animal = register_animal(&mut registry);

        // re-tag by redeclaring the property on the derived class
        let dog = dog_base(registry.declare::<Dog>("Dog"))
            .unwrap()
            .property("name", |d: &Dog| d.animal.name.to_uppercase())
            .tag("display")
            .unwrap()
            .register()
            .unwrap();

        assert!(dog.property("name").unwrap().tags().has_tag(&"display".into()));
        assert!(!animal.property("name").unwrap().tags().has_tag(&"display".into()));
    }

    #[test]
    fn test_constructor_does_not_change_current() {
        let mut registry = ClassRegistry::new();
        let class = registry
            .declare::<Animal>("Animal")
            .property("legs", |a: &Animal| a.legs)
            .constructor(|| Animal::default())
            .constructor(|name: String, legs: i64| Animal { name, legs })
            .readable(true)
            .unwrap()
            .register()
            .unwrap();

        assert_eq!(class.constructors().len(), 2);
        let spider = class
            .construct(vec![Value::from("spider"), Value::Int(8)])
            .unwrap();
        assert_eq!(spider.downcast_ref::<Animal>().unwrap().legs, 8);
    }

    #[test]
    fn test_construct_picks_first_constructor_in_range() {
        let mut registry = ClassRegistry::new();
        let class = registry
            .declare::<Animal>("Animal")
            .constructor(|legs: i32| Animal { name: "small".to_string(), legs: legs as i64 })
            .constructor(|legs: i64| Animal { name: "large".to_string(), legs })
            .register()
            .unwrap();

        let small = class.construct(vec![Value::Int(6)]).unwrap();
        assert_eq!(small.downcast_ref::<Animal>().unwrap().name, "small");
        let large = class.construct(vec![Value::Int(1 << 40)]).unwrap();
        assert_eq!(large.downcast_ref::<Animal>().unwrap().legs, 1 << 40);
    }

    struct AnimalBindings;

    impl ExternalMapper<Animal> for AnimalBindings {
        fn properties(&self) -> Vec<Property> {
            vec![
                Property::read_only("legs", |a: &Animal| a.legs),
                Property::read_only("has_name", |a: &Animal| !a.name.is_empty()),
            ]
        }

        fn functions(&self) -> Vec<Function> {
            vec![Function::method("walk", |a: &mut Animal, steps: i64| steps * a.legs)]
        }
    }

    #[test]
    fn test_external_mapper() {
        let mut registry = ClassRegistry::new();
        let class = registry
            .declare::<Animal>("Animal")
            .property("legs", |_: &Animal| 0i64)
            .external(AnimalBindings)
            .register()
            .unwrap();

        assert_eq!(class.properties().len(), 2);
        assert_eq!(class.property("legs").unwrap().owner(), "Animal");
        let mut cat = Animal { name: "cat".to_string(), legs: 4 };
        assert_eq!(class.property_value("legs", &cat), Ok(Value::Int(4)));
        assert_eq!(
            class.call("walk", &mut cat, vec![Value::Int(3)]),
            Ok(Value::Int(12))
        );
    }
}
