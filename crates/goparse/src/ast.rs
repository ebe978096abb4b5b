//! Typed Go syntax model
//!
//! A closed set of shapes lowered from the tree-sitter CST. Only the parts of a
//! file that matter for class extraction are kept: imports, type declarations
//! and function/method signatures.

use std::collections::HashMap;

/// One parsed `.go` file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceFile {
    /// Name from the `package` clause
    pub package: String,
    pub imports: Vec<Import>,
    /// Top-level declarations in file order
    pub decls: Vec<Decl>,
}

impl SourceFile {
    /// Selector qualifier -> package name, for every import usable as a
    /// qualifier. Dot and blank imports are skipped.
    pub fn import_aliases(&self) -> HashMap<String, String> {
        self.imports
            .iter()
            .filter_map(|import| {
                let qualifier = match import.alias.as_deref() {
                    Some("." | "_") => return None,
                    Some(alias) => alias,
                    None => import.package_name(),
                };
                Some((qualifier.to_string(), import.package_name().to_string()))
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub alias: Option<String>,
    /// Import path without quotes
    pub path: String,
}

impl Import {
    /// Last path segment, e.g. `yaml` for `gopkg.in/yaml`.
    pub fn package_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Type(TypeSpec),
    Func(FuncDecl),
}

/// `type Name[T any] <type>` or `type Name = <type>`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSpec {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub ty: TypeExpr,
    /// `type A = B`
    pub is_alias: bool,
}

/// `K, V comparable` inside a type parameter list
#[derive(Debug, Clone, PartialEq)]
pub struct TypeParam {
    pub names: Vec<String>,
    pub constraint: TypeExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub name: String,
    /// Present for methods
    pub receiver: Option<Receiver>,
    pub type_params: Vec<TypeParam>,
    pub signature: FuncType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Receiver {
    pub ty: TypeExpr,
}

impl Receiver {
    /// Receiver base type name with pointer and type arguments removed:
    /// `(s *Stack[T])` -> `Stack`.
    pub fn type_name(&self) -> Option<&str> {
        fn base(ty: &TypeExpr) -> Option<&str> {
            match ty {
                TypeExpr::Ident(name) => Some(name),
                TypeExpr::Pointer(inner) | TypeExpr::Paren(inner) => base(inner),
                TypeExpr::Generic { base: inner, .. } => base(inner),
                _ => None,
            }
        }
        base(&self.ty)
    }

    /// Type parameter names introduced by the receiver: `(s *Stack[T])` -> `["T"]`.
    pub fn type_param_names(&self) -> Vec<String> {
        fn collect(ty: &TypeExpr, out: &mut Vec<String>) {
            match ty {
                TypeExpr::Pointer(inner) | TypeExpr::Paren(inner) => collect(inner, out),
                TypeExpr::Generic { args, .. } => {
                    for arg in args {
                        if let TypeExpr::Ident(name) = arg {
                            out.push(name.clone());
                        }
                    }
                }
                _ => {}
            }
        }
        let mut names = Vec::new();
        collect(&self.ty, &mut names);
        names
    }
}

/// Parameter or result entry. Grouped names (`a, b int`) are expanded into one
/// entry each.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Option<String>,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FuncType {
    pub params: Vec<Param>,
    pub results: Vec<Param>,
}

/// Struct member. `names` is empty for an embedded field; a pointer-embedded
/// field carries a `TypeExpr::Pointer`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub names: Vec<String>,
    pub ty: TypeExpr,
}

impl FieldDecl {
    pub fn is_embedded(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterfaceElem {
    Method { name: String, signature: FuncType },
    /// Embedded interface name, or a constraint term / union
    Embedded(TypeExpr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Ident(String),
    /// `pkg.Name`
    Qualified { package: String, name: String },
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    /// `[N]T`, length dropped
    Array(Box<TypeExpr>),
    Map { key: Box<TypeExpr>, value: Box<TypeExpr> },
    Chan { dir: ChanDir, elem: Box<TypeExpr> },
    Func(FuncType),
    Struct(Vec<FieldDecl>),
    Interface(Vec<InterfaceElem>),
    /// `Name[A, B]`
    Generic { base: Box<TypeExpr>, args: Vec<TypeExpr> },
    /// `...T`
    Variadic(Box<TypeExpr>),
    /// `A | B`
    Union(Vec<TypeExpr>),
    /// `~T`
    Approx(Box<TypeExpr>),
    Paren(Box<TypeExpr>),
    /// A CST node kind the lowering does not model
    Unknown(String),
}

impl TypeExpr {
    pub fn ident(name: &str) -> Self {
        Self::Ident(name.to_string())
    }

    pub fn pointer(inner: TypeExpr) -> Self {
        Self::Pointer(Box::new(inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_aliases_skip_dot_and_blank() {
        let file = SourceFile {
            package: "main".to_string(),
            imports: vec![
                Import { alias: Some("y".to_string()), path: "gopkg.in/yaml.v3".to_string() },
                Import { alias: Some(".".to_string()), path: "strings".to_string() },
                Import { alias: Some("_".to_string()), path: "embed".to_string() },
                Import { alias: None, path: "fmt".to_string() },
            ],
            decls: vec![],
        };
        let aliases = file.import_aliases();
        assert_eq!(aliases.len(), 2);
        assert_eq!(aliases.get("y").map(String::as_str), Some("yaml.v3"));
        assert_eq!(aliases.get("fmt").map(String::as_str), Some("fmt"));
        assert!(!aliases.contains_key("strings"));
    }

    #[test]
    fn test_receiver_type_name_strips_pointer_and_args() {
        let receiver = Receiver {
            ty: TypeExpr::pointer(TypeExpr::Generic {
                base: Box::new(TypeExpr::ident("Stack")),
                args: vec![TypeExpr::ident("T")],
            }),
        };
        assert_eq!(receiver.type_name(), Some("Stack"));
        assert_eq!(receiver.type_param_names(), vec!["T".to_string()]);
    }

    #[test]
    fn test_embedded_field() {
        let field = FieldDecl { names: vec![], ty: TypeExpr::pointer(TypeExpr::ident("Engine")) };
        assert!(field.is_embedded());
    }
}
