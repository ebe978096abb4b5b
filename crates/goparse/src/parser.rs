//! Go parser - tree-sitter CST lowered into the typed syntax model

use crate::ast::{
    ChanDir, Decl, FieldDecl, FuncDecl, FuncType, Import, InterfaceElem, Param, Receiver,
    SourceFile, TypeExpr, TypeParam, TypeSpec,
};
use crate::error::{ParseError, Result};
use std::fs;
use std::path::Path;
use tracing::debug;
use tree_sitter::{Node, Parser};

/// Go source parser
pub struct GoParser {
    parser: Parser,
}

impl GoParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language = tree_sitter_go::language();
        parser.set_language(&language)?;
        Ok(Self { parser })
    }

    /// Read and parse a file from disk
    pub fn parse_file(&mut self, path: &Path) -> Result<SourceFile> {
        let content = fs::read_to_string(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse_source(&content, path)
    }

    /// Parse source text. `path` is only used for error reporting.
    ///
    /// Any ERROR or MISSING node in the tree is a syntax error.
    pub fn parse_source(&mut self, content: &str, path: &Path) -> Result<SourceFile> {
        let tree = self
            .parser
            .parse(content.as_bytes(), None)
            .ok_or_else(|| ParseError::NoTree(path.to_path_buf()))?;

        let root = tree.root_node();
        if root.has_error() {
            let node = first_error(root).unwrap_or(root);
            let point = node.start_position();
            return Err(ParseError::Syntax {
                path: path.to_path_buf(),
                line: point.row + 1,
                column: point.column + 1,
            });
        }

        let lowering = Lowering { source: content };
        let file = lowering.source_file(root);
        debug!("Parsed {}: {} declarations", path.display(), file.decls.len());
        Ok(file)
    }
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error(child) {
            return Some(found);
        }
    }
    Some(node)
}

/// Named children without comments, which tree-sitter places anywhere as extras
fn members(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    let nodes = node
        .named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .collect();
    nodes
}

fn has_token(node: Node, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| c.kind() == token);
    found
}

struct Lowering<'a> {
    source: &'a str,
}

impl<'a> Lowering<'a> {
    fn text(&self, node: Node) -> &'a str {
        &self.source[node.byte_range()]
    }

    fn field_texts(&self, node: Node, field: &str) -> Vec<String> {
        let mut cursor = node.walk();
        let names = node
            .children_by_field_name(field, &mut cursor)
            .map(|n| self.text(n).to_string())
            .collect();
        names
    }

    fn source_file(&self, root: Node) -> SourceFile {
        let mut file = SourceFile::default();

        for child in members(root) {
            match child.kind() {
                "package_clause" => {
                    if let Some(name) = members(child).first() {
                        file.package = self.text(*name).to_string();
                    }
                }
                "import_declaration" => self.imports(child, &mut file.imports),
                "type_declaration" => {
                    for spec in members(child) {
                        match spec.kind() {
                            "type_spec" => file.decls.push(Decl::Type(self.type_spec(spec, false))),
                            "type_alias" => file.decls.push(Decl::Type(self.type_spec(spec, true))),
                            _ => {}
                        }
                    }
                }
                "function_declaration" | "method_declaration" => {
                    file.decls.push(Decl::Func(self.func_decl(child)));
                }
                _ => {}
            }
        }

        file
    }

    fn imports(&self, node: Node, imports: &mut Vec<Import>) {
        for child in members(node) {
            match child.kind() {
                "import_spec_list" => self.imports(child, imports),
                "import_spec" => {
                    let alias = child
                        .child_by_field_name("name")
                        .map(|n| self.text(n).to_string());
                    let path = child
                        .child_by_field_name("path")
                        .map(|n| self.text(n).trim_matches(|c| c == '"' || c == '`').to_string())
                        .unwrap_or_default();
                    imports.push(Import { alias, path });
                }
                _ => {}
            }
        }
    }

    fn type_spec(&self, node: Node, is_alias: bool) -> TypeSpec {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string())
            .unwrap_or_default();
        let type_params = node
            .child_by_field_name("type_parameters")
            .map(|n| self.type_params(n))
            .unwrap_or_default();
        TypeSpec {
            name,
            type_params,
            ty: self.type_field(node, "type"),
            is_alias,
        }
    }

    fn type_params(&self, node: Node) -> Vec<TypeParam> {
        members(node)
            .into_iter()
            .filter(|c| matches!(c.kind(), "type_parameter_declaration" | "parameter_declaration"))
            .map(|decl| TypeParam {
                names: self.field_texts(decl, "name"),
                constraint: self.type_field(decl, "type"),
            })
            .collect()
    }

    fn func_decl(&self, node: Node) -> FuncDecl {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string())
            .unwrap_or_default();

        let receiver = node.child_by_field_name("receiver").and_then(|list| {
            let param = members(list).into_iter().next()?;
            Some(Receiver { ty: self.type_field(param, "type") })
        });

        let type_params = node
            .child_by_field_name("type_parameters")
            .map(|n| self.type_params(n))
            .unwrap_or_default();

        FuncDecl {
            name,
            receiver,
            type_params,
            signature: self.signature(node),
        }
    }

    /// `parameters` + `result` fields shared by functions, methods,
    /// interface methods and function types
    fn signature(&self, node: Node) -> FuncType {
        FuncType {
            params: node
                .child_by_field_name("parameters")
                .map(|n| self.params(n))
                .unwrap_or_default(),
            results: match node.child_by_field_name("result") {
                Some(result) if result.kind() == "parameter_list" => self.params(result),
                Some(result) => vec![Param { name: None, ty: self.type_expr(result) }],
                None => Vec::new(),
            },
        }
    }

    fn params(&self, list: Node) -> Vec<Param> {
        let mut params = Vec::new();
        for decl in members(list) {
            match decl.kind() {
                "parameter_declaration" => {
                    let ty = self.type_field(decl, "type");
                    let names = self.field_texts(decl, "name");
                    if names.is_empty() {
                        params.push(Param { name: None, ty });
                    } else {
                        for name in names {
                            params.push(Param { name: Some(name), ty: ty.clone() });
                        }
                    }
                }
                "variadic_parameter_declaration" => {
                    params.push(Param {
                        name: decl.child_by_field_name("name").map(|n| self.text(n).to_string()),
                        ty: TypeExpr::Variadic(Box::new(self.type_field(decl, "type"))),
                    });
                }
                _ => {}
            }
        }
        params
    }

    fn struct_fields(&self, node: Node) -> Vec<FieldDecl> {
        let Some(list) = members(node).into_iter().find(|c| c.kind() == "field_declaration_list")
        else {
            return Vec::new();
        };

        members(list)
            .into_iter()
            .filter(|c| c.kind() == "field_declaration")
            .map(|decl| {
                let names = self.field_texts(decl, "name");
                let mut ty = self.type_field(decl, "type");
                if names.is_empty() && has_token(decl, "*") {
                    ty = TypeExpr::pointer(ty);
                }
                FieldDecl { names, ty }
            })
            .collect()
    }

    fn interface_elems(&self, node: Node, elems: &mut Vec<InterfaceElem>) {
        for child in members(node) {
            match child.kind() {
                // older grammars wrap the body in a list node
                "method_spec_list" => self.interface_elems(child, elems),
                "method_elem" | "method_spec" => elems.push(InterfaceElem::Method {
                    name: child
                        .child_by_field_name("name")
                        .map(|n| self.text(n).to_string())
                        .unwrap_or_default(),
                    signature: self.signature(child),
                }),
                _ => elems.push(InterfaceElem::Embedded(self.type_expr(child))),
            }
        }
    }

    fn type_field(&self, node: Node, field: &str) -> TypeExpr {
        match node.child_by_field_name(field) {
            Some(child) => self.type_expr(child),
            None => TypeExpr::Unknown(format!("missing {field}")),
        }
    }

    fn first_member(&self, node: Node) -> TypeExpr {
        match members(node).first() {
            Some(child) => self.type_expr(*child),
            None => TypeExpr::Unknown(node.kind().to_string()),
        }
    }

    fn type_expr(&self, node: Node) -> TypeExpr {
        match node.kind() {
            "type_identifier" | "identifier" => TypeExpr::Ident(self.text(node).to_string()),
            "qualified_type" => TypeExpr::Qualified {
                package: node
                    .child_by_field_name("package")
                    .map(|n| self.text(n).to_string())
                    .unwrap_or_default(),
                name: node
                    .child_by_field_name("name")
                    .map(|n| self.text(n).to_string())
                    .unwrap_or_default(),
            },
            "pointer_type" => TypeExpr::Pointer(Box::new(self.first_member(node))),
            "parenthesized_type" => TypeExpr::Paren(Box::new(self.first_member(node))),
            "negated_type" => TypeExpr::Approx(Box::new(self.first_member(node))),
            "slice_type" => TypeExpr::Slice(Box::new(self.type_field(node, "element"))),
            "array_type" | "implicit_length_array_type" => {
                TypeExpr::Array(Box::new(self.type_field(node, "element")))
            }
            "map_type" => TypeExpr::Map {
                key: Box::new(self.type_field(node, "key")),
                value: Box::new(self.type_field(node, "value")),
            },
            "channel_type" => {
                let mut cursor = node.walk();
                let tokens: Vec<&str> = node.children(&mut cursor).map(|c| c.kind()).collect();
                let dir = match tokens.as_slice() {
                    ["<-", ..] => ChanDir::Recv,
                    [_, "<-", ..] => ChanDir::Send,
                    _ => ChanDir::Both,
                };
                TypeExpr::Chan { dir, elem: Box::new(self.type_field(node, "value")) }
            }
            "function_type" => TypeExpr::Func(self.signature(node)),
            "struct_type" => TypeExpr::Struct(self.struct_fields(node)),
            "interface_type" => {
                let mut elems = Vec::new();
                self.interface_elems(node, &mut elems);
                TypeExpr::Interface(elems)
            }
            "generic_type" => TypeExpr::Generic {
                base: Box::new(self.type_field(node, "type")),
                args: node
                    .child_by_field_name("type_arguments")
                    .map(|args| members(args).into_iter().map(|a| self.type_expr(a)).collect())
                    .unwrap_or_default(),
            },
            "type_elem" | "type_constraint" | "constraint_elem" => {
                let mut terms: Vec<TypeExpr> =
                    members(node).into_iter().map(|t| self.type_expr(t)).collect();
                if terms.len() == 1 {
                    terms.remove(0)
                } else {
                    TypeExpr::Union(terms)
                }
            }
            "constraint_term" => {
                let inner = self.first_member(node);
                if has_token(node, "~") {
                    TypeExpr::Approx(Box::new(inner))
                } else {
                    inner
                }
            }
            other => TypeExpr::Unknown(other.to_string()),
        }
    }
}
