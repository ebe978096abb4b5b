//! Type-expression resolver
//!
//! Turns a `TypeExpr` into its canonical string plus the named types it
//! depends on. Pure: no access to the entity model.

use goparse::{ChanDir, FuncType, InterfaceElem, TypeExpr};
use std::collections::{HashMap, HashSet};

/// Stands in for "the package being parsed" until the package path is known
pub const PACKAGE_MARKER: &str = "{packageType}";

/// Package name used for aliases of primitive types
pub const BUILTIN_PACKAGE: &str = "__builtin__";

const PRIMITIVES: &[&str] = &[
    "bool", "string", "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16",
    "uint32", "uint64", "uintptr", "byte", "rune", "float32", "float64", "complex64",
    "complex128", "error", "any",
];

/// Built-in primitive name, or pointer to one
pub fn is_primitive(name: &str) -> bool {
    let base = name.strip_prefix('*').unwrap_or(name);
    PRIMITIVES.contains(&base)
}

/// Replace the package marker. An empty package drops the qualifier
/// entirely, which is the display form.
pub fn qualify(repr: &str, package: &str) -> String {
    if package.is_empty() {
        repr.replace(&format!("{PACKAGE_MARKER}."), "")
    } else {
        repr.replace(PACKAGE_MARKER, package)
    }
}

/// Relationship target for a resolved name: pointer marker and type
/// arguments removed (`*pkg.Box[T]` -> `pkg.Box`).
pub fn relation_target(repr: &str) -> String {
    let name = repr.strip_prefix('*').unwrap_or(repr);
    match name.find('[') {
        Some(idx) if idx > 0 => name[..idx].to_string(),
        _ => name.to_string(),
    }
}

/// Return-list tail: nothing, ` T`, or ` (A, B)`
pub fn format_results(results: &[String]) -> String {
    match results {
        [] => String::new(),
        [single] => format!(" {single}"),
        many => format!(" ({})", many.join(", ")),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedType {
    pub repr: String,
    pub deps: Vec<String>,
}

impl ResolvedType {
    fn plain(repr: String) -> Self {
        Self { repr, deps: Vec::new() }
    }

    fn named(repr: String) -> Self {
        Self { deps: vec![repr.clone()], repr }
    }

    fn wrap(self, prefix: &str) -> Self {
        Self { repr: format!("{prefix}{}", self.repr), deps: self.deps }
    }
}

/// Resolver for one declaration scope
pub struct TypeResolver<'a> {
    aliases: &'a HashMap<String, String>,
    type_params: HashSet<String>,
}

impl<'a> TypeResolver<'a> {
    pub fn new(aliases: &'a HashMap<String, String>) -> Self {
        Self {
            aliases,
            type_params: HashSet::new(),
        }
    }

    /// Type parameters in scope resolve to themselves and are never dependencies
    pub fn with_type_params<I>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.type_params.extend(names);
        self
    }

    pub fn resolve(&self, ty: &TypeExpr) -> ResolvedType {
        match ty {
            TypeExpr::Ident(name) => {
                if is_primitive(name) || self.type_params.contains(name) {
                    ResolvedType::plain(name.clone())
                } else {
                    ResolvedType::named(format!("{PACKAGE_MARKER}.{name}"))
                }
            }
            TypeExpr::Qualified { package, name } => {
                let package = self.aliases.get(package).unwrap_or(package);
                ResolvedType::named(format!("{package}.{name}"))
            }
            TypeExpr::Pointer(inner) => self.resolve(inner).wrap("*"),
            TypeExpr::Slice(elem) | TypeExpr::Array(elem) => self.resolve(elem).wrap("[]"),
            TypeExpr::Variadic(inner) => self.resolve(inner).wrap("..."),
            TypeExpr::Approx(inner) => self.resolve(inner).wrap("~"),
            TypeExpr::Paren(inner) => self.resolve(inner),
            TypeExpr::Chan { dir, elem } => {
                let prefix = match dir {
                    ChanDir::Both => "chan ",
                    ChanDir::Send => "chan<- ",
                    ChanDir::Recv => "<-chan ",
                };
                self.resolve(elem).wrap(prefix)
            }
            TypeExpr::Map { key, value } => {
                let key = self.resolve(key);
                let value = self.resolve(value);
                let mut deps = key.deps;
                deps.extend(value.deps);
                ResolvedType {
                    repr: format!("map[{}]{}", key.repr, value.repr),
                    deps,
                }
            }
            TypeExpr::Generic { base, args } => {
                let mut resolved = self.resolve(base);
                let mut reprs = Vec::with_capacity(args.len());
                for arg in args {
                    let arg = self.resolve(arg);
                    reprs.push(arg.repr);
                    resolved.deps.extend(arg.deps);
                }
                resolved.repr = format!("{}[{}]", resolved.repr, reprs.join(", "));
                resolved
            }
            TypeExpr::Union(terms) => {
                let mut deps = Vec::new();
                let mut reprs = Vec::with_capacity(terms.len());
                for term in terms {
                    let term = self.resolve(term);
                    reprs.push(term.repr);
                    deps.extend(term.deps);
                }
                ResolvedType { repr: reprs.join(" | "), deps }
            }
            TypeExpr::Func(signature) => ResolvedType::plain(format!("func{}", self.signature(signature))),
            TypeExpr::Struct(fields) => {
                let members: Vec<String> =
                    fields.iter().map(|f| self.resolve(&f.ty).repr).collect();
                ResolvedType::plain(format!("struct{{{}}}", members.join(", ")))
            }
            TypeExpr::Interface(_) => ResolvedType::plain("interface{}".to_string()),
            TypeExpr::Unknown(_) => ResolvedType::default(),
        }
    }

    /// `(int, string) (bool, error)` - parameter types plus result tail
    pub fn signature(&self, signature: &FuncType) -> String {
        let params: Vec<String> = signature
            .params
            .iter()
            .map(|p| self.resolve(&p.ty).repr)
            .collect();
        let results: Vec<String> = signature
            .results
            .iter()
            .map(|p| self.resolve(&p.ty).repr)
            .collect();
        format!("({}){}", params.join(", "), format_results(&results))
    }

    /// Constraint of a type parameter in display form. Interface constraint
    /// literals keep their elements: `interface{~int | ~string; String() string}`.
    pub fn constraint(&self, ty: &TypeExpr) -> String {
        let repr = match ty {
            TypeExpr::Interface(elems) => {
                let parts: Vec<String> = elems
                    .iter()
                    .map(|elem| match elem {
                        InterfaceElem::Method { name, signature } => {
                            format!("{name}{}", self.signature(signature))
                        }
                        InterfaceElem::Embedded(inner) => self.resolve(inner).repr,
                    })
                    .collect();
                format!("interface{{{}}}", parts.join("; "))
            }
            other => self.resolve(other).repr,
        };
        qualify(&repr, "")
    }
}
