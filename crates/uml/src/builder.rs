//! Entity model builder - one file's declarations into the model

use crate::classify::FunctionClassifier;
use crate::model::{is_private_name, Alias, EntityModel, Field, Method, TypeId, TypeKind, TypeParameter};
use crate::resolver::{is_primitive, qualify, relation_target, TypeResolver, BUILTIN_PACKAGE};
use goparse::{
    Decl, FieldDecl, FuncDecl, FuncType, InterfaceElem, Receiver, SourceFile, TypeExpr, TypeParam,
    TypeSpec,
};
use std::collections::HashMap;
use tracing::debug;

/// Populates an [`EntityModel`] file by file
pub struct ModelBuilder<'m> {
    model: &'m mut EntityModel,
    classifier: &'m FunctionClassifier,
    /// Last path segment -> dotted package path, `None` when ambiguous
    known_packages: HashMap<String, Option<String>>,
}

impl<'m> ModelBuilder<'m> {
    pub fn new(model: &'m mut EntityModel, classifier: &'m FunctionClassifier) -> Self {
        Self {
            model,
            classifier,
            known_packages: HashMap::new(),
        }
    }

    /// Packages being analyzed. An import whose name matches the last
    /// segment of exactly one of them resolves to that package's dotted path.
    pub fn with_known_packages<'p, I>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = &'p str>,
    {
        for package in packages {
            let segment = package.rsplit('.').next().unwrap_or(package).to_string();
            self.known_packages
                .entry(segment)
                .and_modify(|existing| {
                    if existing.as_deref() != Some(package) {
                        *existing = None;
                    }
                })
                .or_insert_with(|| Some(package.to_string()));
        }
        self
    }

    /// Visit every top-level declaration of `file`, in file order
    pub fn add_file(&mut self, package_path: &str, file: &SourceFile) {
        let aliases = self.import_table(file);
        for decl in &file.decls {
            match decl {
                Decl::Type(spec) => self.add_type(package_path, spec, &aliases),
                Decl::Func(func) => match &func.receiver {
                    Some(receiver) => self.add_method(package_path, func, receiver, &aliases),
                    None => self.add_function(package_path, func, &aliases),
                },
            }
        }
    }

    /// Import qualifiers mapped to analyzed packages where unambiguous,
    /// otherwise to the imported package name
    fn import_table(&self, file: &SourceFile) -> HashMap<String, String> {
        let mut table = file.import_aliases();
        for package in table.values_mut() {
            let segment = package.replace('.', "_");
            if let Some(Some(known)) = self.known_packages.get(&segment) {
                *package = known.clone();
            }
        }
        table
    }

    fn add_type(&mut self, package: &str, spec: &TypeSpec, aliases: &HashMap<String, String>) {
        let resolver = TypeResolver::new(aliases).with_type_params(param_names(&spec.type_params));
        let id = self.model.get_or_insert(package, &spec.name);
        self.model.get_mut(id).type_parameters = type_parameters(&resolver, &spec.type_params);

        match &spec.ty {
            TypeExpr::Struct(fields) if !spec.is_alias => {
                self.model.get_mut(id).kind = Some(TypeKind::Struct);
                for field in fields {
                    self.add_field(id, field, &resolver);
                }
            }
            TypeExpr::Interface(elems) if !spec.is_alias => {
                self.model.get_mut(id).kind = Some(TypeKind::Interface);
                for elem in elems {
                    self.add_interface_elem(id, elem, &resolver);
                }
            }
            other => self.add_alias(id, other, &resolver),
        }
    }

    /// Named fields feed aggregations; embedded fields feed composition
    /// (pointer) or extends (value).
    pub fn add_field(&mut self, id: TypeId, field: &FieldDecl, resolver: &TypeResolver) {
        let resolved = resolver.resolve(&field.ty);
        let record = self.model.get_mut(id);
        let package = record.package_path.clone();

        if field.is_embedded() {
            let full = qualify(&resolved.repr, &package);
            match full.strip_prefix('*') {
                Some(target) => record.composition.insert(relation_target(target)),
                None => record.extends.insert(relation_target(&full)),
            };
            return;
        }

        for name in &field.names {
            record.fields.push(Field {
                name: name.clone(),
                ty: qualify(&resolved.repr, ""),
                full_type: Some(qualify(&resolved.repr, &package)),
            });

            let targets = resolved
                .deps
                .iter()
                .filter(|dep| !is_primitive(dep))
                .map(|dep| relation_target(&qualify(dep, &package)));
            if is_private_name(name) {
                record.private_aggregations.extend(targets);
            } else {
                record.aggregations.extend(targets);
            }
        }
    }

    fn add_interface_elem(&mut self, id: TypeId, elem: &InterfaceElem, resolver: &TypeResolver) {
        let package = self.model.get(id).package_path.clone();
        match elem {
            InterfaceElem::Method { name, signature } => {
                let method = build_method(&package, name, signature, resolver);
                self.model.get_mut(id).methods.push(method);
            }
            InterfaceElem::Embedded(
                ty @ (TypeExpr::Ident(_) | TypeExpr::Qualified { .. } | TypeExpr::Generic { .. }),
            ) => {
                let resolved = resolver.resolve(ty);
                if resolved.deps.is_empty() {
                    // `any`, `error` or a type parameter: nothing to link
                    return;
                }
                let target = relation_target(&qualify(&resolved.repr, &package));
                self.model.get_mut(id).composition.insert(target);
            }
            // unions and ~T terms only constrain type sets
            InterfaceElem::Embedded(_) => {}
        }
    }

    fn add_alias(&mut self, id: TypeId, underlying: &TypeExpr, resolver: &TypeResolver) {
        let resolved = resolver.resolve(underlying);
        let record = self.model.get_mut(id);
        record.kind = Some(TypeKind::Alias);

        let alias_of = if is_primitive(&resolved.repr) {
            match resolved.repr.strip_prefix('*') {
                Some(base) => format!("*{BUILTIN_PACKAGE}.{base}"),
                None => format!("{BUILTIN_PACKAGE}.{}", resolved.repr),
            }
        } else {
            qualify(&resolved.repr, &record.package_path)
        };
        let alias = Alias::new(&record.package_path, &record.name, alias_of);
        self.model.add_alias(alias);
    }

    fn add_method(
        &mut self,
        package: &str,
        func: &FuncDecl,
        receiver: &Receiver,
        aliases: &HashMap<String, String>,
    ) {
        let Some(type_name) = receiver.type_name() else {
            debug!(method = %func.name, "receiver type not recognised, skipping");
            return;
        };

        let mut scope = receiver.type_param_names();
        scope.extend(param_names(&func.type_params));
        let resolver = TypeResolver::new(aliases).with_type_params(scope);
        let method = build_method(package, &func.name, &func.signature, &resolver);

        let id = self.model.get_or_insert(package, type_name);
        let record = self.model.get_mut(id);
        if record.kind.is_none() {
            record.kind = Some(TypeKind::Struct);
        }
        record.methods.push(method);
    }

    fn add_function(&mut self, package: &str, func: &FuncDecl, aliases: &HashMap<String, String>) {
        let resolver = TypeResolver::new(aliases).with_type_params(param_names(&func.type_params));
        let method = build_method(package, &func.name, &func.signature, &resolver);

        let category = self.classifier.classify(&func.name);
        let id = self.model.get_or_insert(package, category);
        let record = self.model.get_mut(id);
        if record.kind.is_none() {
            record.kind = Some(TypeKind::Functions);
        }
        record.methods.push(method);
    }
}

fn param_names(params: &[TypeParam]) -> Vec<String> {
    params.iter().flat_map(|p| p.names.iter().cloned()).collect()
}

fn type_parameters(resolver: &TypeResolver, params: &[TypeParam]) -> Vec<TypeParameter> {
    let mut out = Vec::new();
    for param in params {
        let constraint = resolver.constraint(&param.constraint);
        for name in &param.names {
            out.push(TypeParameter {
                name: name.clone(),
                constraint: constraint.clone(),
            });
        }
    }
    out
}

/// Method with display types plus package-qualified types for signature
/// comparison across packages
fn build_method(package: &str, name: &str, signature: &FuncType, resolver: &TypeResolver) -> Method {
    let parameters = signature
        .params
        .iter()
        .map(|param| {
            let resolved = resolver.resolve(&param.ty);
            Field {
                name: param.name.clone().unwrap_or_default(),
                ty: qualify(&resolved.repr, ""),
                full_type: Some(qualify(&resolved.repr, package)),
            }
        })
        .collect();

    let results: Vec<String> = signature
        .results
        .iter()
        .map(|result| resolver.resolve(&result.ty).repr)
        .collect();

    Method {
        name: name.to_string(),
        parameters,
        return_values: results.iter().map(|r| qualify(r, "")).collect(),
        full_return_values: results.iter().map(|r| qualify(r, package)).collect(),
        package_path: package.to_string(),
    }
}
