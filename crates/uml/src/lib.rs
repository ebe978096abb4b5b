//! uml - Go class diagram extraction
//!
//! Entity model, relationship inference, package hierarchy and PlantUML rendering

mod analyzer;
mod builder;
mod classify;
mod hierarchy;
mod model;
mod options;
mod relations;
mod render;
mod resolver;

pub use analyzer::{Analysis, ClassAnalyzer, Result, UmlError};
pub use builder::ModelBuilder;
pub use classify::{Category, FunctionClassifier, DEFAULT_CATEGORY};
pub use hierarchy::{HierarchyError, PackageHierarchy, PackageId, PackageNode};
pub use model::{
    is_private_name, Alias, EntityModel, Field, Method, TypeId, TypeKind, TypeParameter,
    TypeRecord,
};
pub use options::RenderingOptions;
pub use relations::{method_set, resolve_implementations};
pub use render::PlantUmlRenderer;
pub use resolver::{ResolvedType, TypeResolver, BUILTIN_PACKAGE, PACKAGE_MARKER};
