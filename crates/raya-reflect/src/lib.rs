//! Raya Reflect
//!
//! Runtime metaclasses for native Rust types:
//! - **Classes**: named metaclasses with ordered properties, functions,
//!   constructors, tags and base classes (`class` module)
//! - **Builder**: fluent declaration sessions that flatten inherited members
//!   into derived classes (`builder` module)
//! - **Registry**: lookup by type identity or name, plus one process-wide
//!   registry (`registry` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use raya_reflect::ClassRegistry;
//!
//! struct Shape { id: i64 }
//! struct Circle { shape: Shape, radius: f64 }
//!
//! let mut registry = ClassRegistry::new();
//! registry
//!     .declare::<Shape>("Shape")
//!     .property("id", |s: &Shape| s.id)
//!     .register()?;
//! registry
//!     .declare::<Circle>("Circle")
//!     .base(|c: &Circle| &c.shape, |c: &mut Circle| &mut c.shape)?
//!     .property("radius", |c: &Circle| c.radius)
//!     .register()?;
//!
//! let circle = registry.class_by_type::<Circle>()?;
//! let id = circle.property_value("id", &instance)?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod builder;
pub mod class;
pub mod config;
pub mod constructor;
pub mod error;
pub mod function;
pub mod getter;
pub mod property;
pub mod registry;
pub mod table;
pub mod tags;
pub mod value;

pub use builder::{ClassBuilder, ExternalMapper};
pub use class::{BaseLink, Class, FieldUpcast, FunctionTable, PropertyTable, Upcast};
pub use config::{InheritPolicy, RegistryConfig, TagPolicy};
pub use constructor::{Constructor, IntoConstructor};
pub use error::{ReflectError, ReflectResult};
pub use function::{Function, FunctionKind, IntoMethod, IntoStaticFunction, Policy};
pub use getter::Getter;
pub use property::Property;
pub use registry::{class_by_name, class_by_type, configure, declare, reset, ClassRegistry};
pub use table::NameTable;
pub use tags::{TagHolder, TagId};
pub use value::{kind_accepts, FromValue, Value, ValueKind, ValueType};
