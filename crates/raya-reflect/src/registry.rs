//! Class registry
//!
//! Maps native types (by `TypeId`) and class names to their registered
//! metaclasses. A class must be registered before another class can declare it
//! as a base. Besides explicit registries there is one process-wide registry,
//! driven by [`declare`], [`class_by_type`], [`class_by_name`] and [`reset`].

use std::any::{type_name, Any, TypeId};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::builder::ClassBuilder;
use crate::class::Class;
use crate::config::RegistryConfig;
use crate::error::{ReflectError, ReflectResult};

/// Registry of metaclasses
#[derive(Debug, Default)]
pub struct ClassRegistry {
    /// Classes in registration order
    classes: Vec<Arc<Class>>,
    /// Type identity to index
    by_type: FxHashMap<TypeId, usize>,
    /// Class name to index
    by_name: FxHashMap<String, usize>,
    config: RegistryConfig,
}

impl ClassRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with the given configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Configuration applied to declaration sessions
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Replace the configuration. Affects sessions started afterwards.
    pub fn set_config(&mut self, config: RegistryConfig) {
        self.config = config;
    }

    /// Start declaring the class describing `T`
    pub fn declare<T: Any>(&mut self, name: impl Into<String>) -> ClassBuilder<'_, T> {
        ClassBuilder::new(self, name)
    }

    /// Store a finished class
    pub fn register(&mut self, class: Class) -> ReflectResult<Arc<Class>> {
        if self.by_type.contains_key(&class.type_id()) || self.by_name.contains_key(class.name()) {
            return Err(ReflectError::ClassAlreadyRegistered(class.name().to_string()));
        }

        tracing::debug!(
            class = %class.name(),
            properties = class.properties().len(),
            functions = class.functions().len(),
            bases = class.base_count(),
            "registered class"
        );

        let index = self.classes.len();
        self.by_type.insert(class.type_id(), index);
        self.by_name.insert(class.name().to_string(), index);
        let class = Arc::new(class);
        self.classes.push(Arc::clone(&class));
        Ok(class)
    }

    /// Class describing `T`
    pub fn class_by_type<T: Any>(&self) -> ReflectResult<Arc<Class>> {
        self.class_by_type_id(TypeId::of::<T>())
            .ok_or_else(|| ReflectError::ClassNotRegistered(type_name::<T>().to_string()))
    }

    /// Class describing the type with identity `id`
    pub fn class_by_type_id(&self, id: TypeId) -> Option<Arc<Class>> {
        self.by_type.get(&id).map(|&index| Arc::clone(&self.classes[index]))
    }

    /// Class by name
    pub fn class_by_name(&self, name: &str) -> Option<Arc<Class>> {
        self.by_name.get(name).map(|&index| Arc::clone(&self.classes[index]))
    }

    /// Whether `T` has a registered class
    pub fn contains_type<T: Any>(&self) -> bool {
        self.by_type.contains_key(&TypeId::of::<T>())
    }

    /// Iterate over classes in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Class>> + '_ {
        self.classes.iter()
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Forget every class. Configuration is kept.
    pub fn clear(&mut self) {
        self.classes.clear();
        self.by_type.clear();
        self.by_name.clear();
    }
}

static GLOBAL: Lazy<RwLock<ClassRegistry>> = Lazy::new(|| RwLock::new(ClassRegistry::new()));

/// Declare and register a class in the global registry.
///
/// The registry stays write-locked for the whole session, so `session` must
/// not query the global registry itself.
pub fn declare<T, S>(name: &str, session: S) -> ReflectResult<Arc<Class>>
where
    T: Any,
    S: for<'r> FnOnce(ClassBuilder<'r, T>) -> ReflectResult<ClassBuilder<'r, T>>,
{
    let mut registry = GLOBAL.write();
    session(registry.declare::<T>(name))?.register()
}

/// Class describing `T` in the global registry
pub fn class_by_type<T: Any>() -> ReflectResult<Arc<Class>> {
    GLOBAL.read().class_by_type::<T>()
}

/// Class by name in the global registry
pub fn class_by_name(name: &str) -> Option<Arc<Class>> {
    GLOBAL.read().class_by_name(name)
}

/// Configure the global registry. Call before declaring classes.
pub fn configure(config: RegistryConfig) {
    GLOBAL.write().set_config(config);
}

/// Empty the global registry and restore the default configuration.
///
/// Classes already handed out stay alive through their `Arc`s.
pub fn reset() {
    let mut registry = GLOBAL.write();
    registry.clear();
    registry.set_config(RegistryConfig::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Point;
    struct Circle;

    #[test]
    fn test_register_class() {
        let mut registry = ClassRegistry::new();
        let class = registry.register(Class::new::<Point>("Point")).unwrap();

        assert_eq!(class.name(), "Point");
        assert_eq!(registry.len(), 1);
        assert!(registry.contains_type::<Point>());
    }

    #[test]
    fn test_get_class_by_type_and_name() {
        let mut registry = ClassRegistry::new();
        registry.register(Class::new::<Point>("Point")).unwrap();

        let by_type = registry.class_by_type::<Point>().unwrap();
        let by_name = registry.class_by_name("Point").unwrap();
        assert!(Arc::ptr_eq(&by_type, &by_name));
        assert!(registry.class_by_name("Circle").is_none());
    }

    #[test]
    fn test_unregistered_type() {
        let registry = ClassRegistry::new();
        let err = registry.class_by_type::<Circle>().unwrap_err();
        assert!(matches!(err, ReflectError::ClassNotRegistered(name) if name.ends_with("Circle")));
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = ClassRegistry::new();
        registry.register(Class::new::<Point>("Point")).unwrap();

        let same_type = registry.register(Class::new::<Point>("Point2"));
        assert_eq!(
            same_type.unwrap_err(),
            ReflectError::ClassAlreadyRegistered("Point2".to_string())
        );

        let same_name = registry.register(Class::new::<Circle>("Point"));
        assert!(same_name.is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_multiple_classes_in_order() {
        let mut registry = ClassRegistry::new();
        registry.register(Class::new::<Point>("Point")).unwrap();
        registry.register(Class::new::<Circle>("Circle")).unwrap();

        let names: Vec<&str> = registry.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["Point", "Circle"]);
    }

    #[test]
    fn test_clear() {
        let mut registry = ClassRegistry::new();
        let point = registry.register(Class::new::<Point>("Point")).unwrap();
        registry.clear();

        assert!(registry.is_empty());
        assert!(!registry.contains_type::<Point>());
        assert_eq!(point.name(), "Point");
    }
}
