//! PlantUML renderer

use crate::hierarchy::{PackageHierarchy, PackageId};
use crate::model::{EntityModel, Field, Method, TypeKind, TypeRecord};
use crate::options::RenderingOptions;
use crate::resolver::format_results;
use std::collections::{BTreeMap, HashSet};

const INDENT: &str = "    ";

/// PlantUML class diagram generator
pub struct PlantUmlRenderer<'a> {
    options: &'a RenderingOptions,
}

impl<'a> PlantUmlRenderer<'a> {
    pub fn new(options: &'a RenderingOptions) -> Self {
        Self { options }
    }

    /// Full diagram text, deterministic for a given model and options
    pub fn render(&self, model: &EntityModel, hierarchy: &PackageHierarchy) -> String {
        let packages = model.packages();
        let mut lines = vec!["@startuml".to_string()];

        self.header(&mut lines);

        for id in hierarchy.top_level() {
            self.namespace(&mut lines, hierarchy, id, &packages, 0);
        }
        // packages the hierarchy never saw, flat
        for (package, records) in &packages {
            if hierarchy.find(package).is_none() && records.iter().any(|r| self.is_visible(r)) {
                lines.push(format!("namespace {package} {{"));
                for record in records {
                    self.type_block(&mut lines, record, 1);
                }
                lines.push("}".to_string());
            }
        }

        self.edges(&mut lines, model, &packages);

        if self.options.hide_fields {
            lines.push("hide fields".to_string());
        }
        if self.options.hide_methods {
            lines.push("hide methods".to_string());
        }
        lines.push("@enduml".to_string());

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    fn header(&self, lines: &mut Vec<String>) {
        if let Some(title) = &self.options.title {
            lines.push(format!("title {title}"));
        }
        if let Some(notes) = &self.options.notes {
            lines.push("legend".to_string());
            lines.extend(notes.lines().map(str::to_string));
            lines.push("end legend".to_string());
        }
        if self.options.show_options_as_note {
            lines.push("note as OptionsNote".to_string());
            lines.push("<b>Options</b>".to_string());
            for (name, enabled) in self.options.flags() {
                lines.push(format!("{name}: {enabled}"));
            }
            lines.push("end note".to_string());
        }
    }

    fn namespace(
        &self,
        lines: &mut Vec<String>,
        hierarchy: &PackageHierarchy,
        id: PackageId,
        packages: &BTreeMap<&str, Vec<&TypeRecord>>,
        level: usize,
    ) {
        if !self.has_content(hierarchy, id, packages) {
            return;
        }
        let node = hierarchy.node(id);
        let indent = INDENT.repeat(level);
        lines.push(format!("{indent}namespace {} {{", node.full_path));

        if let Some(records) = packages.get(node.full_path.as_str()) {
            for record in records {
                self.type_block(lines, record, level + 1);
            }
        }

        for child in node.children.values() {
            self.namespace(lines, hierarchy, *child, packages, level + 1);
        }
        lines.push(format!("{indent}}}"));
    }

    fn has_content(
        &self,
        hierarchy: &PackageHierarchy,
        id: PackageId,
        packages: &BTreeMap<&str, Vec<&TypeRecord>>,
    ) -> bool {
        let node = hierarchy.node(id);
        let own = packages
            .get(node.full_path.as_str())
            .map(|records| records.iter().any(|r| self.is_visible(r)))
            .unwrap_or(false);
        own || node
            .children
            .values()
            .any(|child| self.has_content(hierarchy, *child, packages))
    }

    fn is_visible(&self, record: &TypeRecord) -> bool {
        match record.kind {
            Some(TypeKind::Functions) => self.options.show_functions,
            Some(_) => true,
            None => false,
        }
    }

    fn type_block(&self, lines: &mut Vec<String>, record: &TypeRecord, level: usize) {
        let head = match record.kind {
            Some(TypeKind::Struct) => format!("class {} << (S,Aquamarine) >>", self.type_name(record)),
            Some(TypeKind::Interface) => format!("interface {}", self.type_name(record)),
            Some(TypeKind::Alias) => format!("class {} << (T, #FF7700) >>", self.type_name(record)),
            Some(TypeKind::Functions) if self.options.show_functions => {
                format!("class {} << (F,LightGreen) >>", record.name)
            }
            _ => return,
        };
        let indent = INDENT.repeat(level);
        let member_indent = INDENT.repeat(level + 1);
        lines.push(format!("{indent}{head} {{"));

        let show_private = !self.options.hide_private_members;
        if !self.options.hide_fields {
            let (private, public): (Vec<&Field>, Vec<&Field>) =
                record.fields.iter().partition(|f| f.is_private());
            if show_private {
                for field in private {
                    lines.push(format!("{member_indent}- {} {}", field.name, field.ty));
                }
            }
            for field in public {
                lines.push(format!("{member_indent}+ {} {}", field.name, field.ty));
            }
        }
        if !self.options.hide_methods {
            let (private, public): (Vec<&Method>, Vec<&Method>) =
                record.methods.iter().partition(|m| m.is_private());
            if show_private {
                for method in private {
                    lines.push(format!("{member_indent}- {}", method_line(method)));
                }
            }
            for method in public {
                lines.push(format!("{member_indent}+ {}", method_line(method)));
            }
        }
        lines.push(format!("{indent}}}"));
    }

    /// `Box<T any>` for generic types
    fn type_name(&self, record: &TypeRecord) -> String {
        if record.type_parameters.is_empty() {
            return record.name.clone();
        }
        let params: Vec<String> = record
            .type_parameters
            .iter()
            .map(|p| format!("{} {}", p.name, p.constraint))
            .collect();
        format!("{}<{}>", record.name, params.join(", "))
    }

    fn edges(
        &self,
        lines: &mut Vec<String>,
        model: &EntityModel,
        packages: &BTreeMap<&str, Vec<&TypeRecord>>,
    ) {
        let mut edges = Vec::new();

        if self.options.show_aliases {
            let mut aliases = model.aliases().to_vec();
            aliases.sort();
            for alias in aliases {
                edges.push(self.edge(&alias.name, "#..", &alias.alias_of, "alias of"));
            }
        }

        let records: Vec<&TypeRecord> = packages
            .values()
            .flatten()
            .copied()
            .filter(|r| self.is_visible(r))
            .collect();

        if self.options.show_compositions {
            for record in &records {
                let name = record.qualified_name();
                for target in &record.composition {
                    edges.push(self.edge(&name, "*--", target, "has"));
                }
            }
        }

        if self.options.show_implementations {
            for record in &records {
                let name = record.qualified_name();
                for parent in &record.extends {
                    let is_interface = model
                        .find_qualified(parent)
                        .map(|id| model.get(id).kind == Some(TypeKind::Interface))
                        .unwrap_or(false);
                    let label = if is_interface { "implements" } else { "extends" };
                    edges.push(self.edge(parent, "<|--", &name, label));
                }
            }
        }

        if self.options.show_aggregations {
            for record in &records {
                let name = record.qualified_name();
                let private = self
                    .options
                    .aggregate_private_members
                    .then_some(&record.private_aggregations);
                for target in record.aggregations.iter().chain(private.into_iter().flatten()) {
                    edges.push(self.edge(&name, "o--", target, "uses"));
                }
            }
        }

        // identical lines only once, first occurrence wins
        let mut seen = HashSet::new();
        for edge in edges {
            if seen.insert(edge.clone()) {
                lines.push(edge);
            }
        }
    }

    fn edge(&self, from: &str, arrow: &str, to: &str, label: &str) -> String {
        if self.options.show_connection_labels {
            format!("\"{from}\" {arrow} \"{to}\" : {label}")
        } else {
            format!("\"{from}\" {arrow} \"{to}\"")
        }
    }
}

/// `Name(a int, b string) (bool, error)`
fn method_line(method: &Method) -> String {
    let params: Vec<String> = method
        .parameters
        .iter()
        .map(|p| {
            if p.name.is_empty() {
                p.ty.clone()
            } else {
                format!("{} {}", p.name, p.ty)
            }
        })
        .collect();
    format!(
        "{}({}){}",
        method.name,
        params.join(", "),
        format_results(&method.return_values)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Alias, TypeParameter};
    use std::path::{Path, PathBuf};

    fn field(name: &str, ty: &str) -> Field {
        Field { name: name.to_string(), ty: ty.to_string(), full_type: None }
    }

    fn method(name: &str, params: Vec<Field>, returns: &[&str]) -> Method {
        let returns: Vec<String> = returns.iter().map(|r| r.to_string()).collect();
        Method {
            name: name.to_string(),
            parameters: params,
            full_return_values: returns.clone(),
            return_values: returns,
            package_path: "proj".to_string(),
        }
    }

    fn fixture() -> (EntityModel, PackageHierarchy) {
        let mut model = EntityModel::new();
        let car = model.get_or_insert("proj", "Car");
        let record = model.get_mut(car);
        record.kind = Some(TypeKind::Struct);
        record.fields = vec![field("Name", "string"), field("speed", "int")];
        record.methods = vec![
            method("Drive", vec![field("to", "string")], &["error"]),
            method("honk", vec![], &[]),
        ];
        record.aggregations.insert("proj.Engine".to_string());
        record.extends.insert("proj.Vehicle".to_string());

        let engine = model.get_or_insert("proj", "Engine");
        model.get_mut(engine).kind = Some(TypeKind::Struct);

        let vehicle = model.get_or_insert("proj", "Vehicle");
        let record = model.get_mut(vehicle);
        record.kind = Some(TypeKind::Interface);
        record.methods = vec![method("Drive", vec![field("to", "string")], &["error"])];

        let mut hierarchy = PackageHierarchy::new(vec![PathBuf::from("/src/proj")]);
        hierarchy.node_for(Path::new("/src/proj")).unwrap();
        (model, hierarchy)
    }

    #[test]
    fn test_envelope_and_type_blocks() {
        let (model, hierarchy) = fixture();
        let options = RenderingOptions::default();
        let out = PlantUmlRenderer::new(&options).render(&model, &hierarchy);

        assert!(out.starts_with("@startuml\n"));
        assert!(out.ends_with("@enduml\n"));
        assert!(out.contains("namespace proj {"));
        assert!(out.contains("    class Car << (S,Aquamarine) >> {"));
        assert!(out.contains("    interface Vehicle {"));
        assert!(out.contains("\"proj.Vehicle\" <|-- \"proj.Car\""));
        assert!(!out.contains("o--"));
    }

    #[test]
    fn test_member_grouping_order() {
        let (model, hierarchy) = fixture();
        let options = RenderingOptions::default();
        let out = PlantUmlRenderer::new(&options).render(&model, &hierarchy);

        let private_field = out.find("- speed int").unwrap();
        let public_field = out.find("+ Name string").unwrap();
        let private_method = out.find("- honk()").unwrap();
        let public_method = out.find("+ Drive(to string) error").unwrap();
        assert!(private_field < public_field);
        assert!(public_field < private_method);
        assert!(private_method < public_method);
    }

    #[test]
    fn test_types_sorted_within_namespace() {
        let (model, hierarchy) = fixture();
        let options = RenderingOptions::default();
        let out = PlantUmlRenderer::new(&options).render(&model, &hierarchy);
        let car = out.find("class Car ").unwrap();
        let engine = out.find("class Engine ").unwrap();
        let vehicle = out.find("interface Vehicle").unwrap();
        assert!(car < engine && engine < vehicle);
    }

    #[test]
    fn test_hide_private_members() {
        let (model, hierarchy) = fixture();
        let options = RenderingOptions { hide_private_members: true, ..Default::default() };
        let out = PlantUmlRenderer::new(&options).render(&model, &hierarchy);
        assert!(!out.contains("speed"));
        assert!(!out.contains("honk"));
        assert!(out.contains("+ Name string"));
    }

    #[test]
    fn test_hide_fields_keeps_methods() {
        let (model, hierarchy) = fixture();
        let options = RenderingOptions { hide_fields: true, ..Default::default() };
        let out = PlantUmlRenderer::new(&options).render(&model, &hierarchy);
        assert!(!out.contains("+ Name string"));
        assert!(out.contains("+ Drive(to string) error"));
        assert!(out.contains("hide fields\n@enduml"));
    }

    #[test]
    fn test_hide_fields_and_methods_closes_blocks() {
        let (model, hierarchy) = fixture();
        let options = RenderingOptions { hide_fields: true, hide_methods: true, ..Default::default() };
        let out = PlantUmlRenderer::new(&options).render(&model, &hierarchy);
        assert!(out.contains("    class Car << (S,Aquamarine) >> {\n    }"));
        assert!(out.contains("hide fields\nhide methods\n@enduml"));
        let opens = out.matches('{').count();
        let closes = out.matches('}').count();
        assert_eq!(opens, closes);
    }

    #[test]
    fn test_aggregations_and_labels() {
        let (model, hierarchy) = fixture();
        let options = RenderingOptions {
            show_aggregations: true,
            show_connection_labels: true,
            ..Default::default()
        };
        let out = PlantUmlRenderer::new(&options).render(&model, &hierarchy);
        assert!(out.contains("\"proj.Car\" o-- \"proj.Engine\" : uses"));
        assert!(out.contains("\"proj.Vehicle\" <|-- \"proj.Car\" : implements"));
    }

    #[test]
    fn test_alias_edges_sorted_and_deduplicated() {
        let (mut model, hierarchy) = fixture();
        model.add_alias(Alias::new("q", "ID", "__builtin__.int".to_string()));
        model.add_alias(Alias::new("p", "ID", "__builtin__.int".to_string()));
        model.add_alias(Alias::new("p", "ID", "__builtin__.int".to_string()));
        let options = RenderingOptions::default();
        let out = PlantUmlRenderer::new(&options).render(&model, &hierarchy);

        assert_eq!(out.matches("\"p.ID\" #.. \"__builtin__.int\"").count(), 1);
        let p = out.find("\"p.ID\"").unwrap();
        let q = out.find("\"q.ID\"").unwrap();
        assert!(p < q);
    }

    #[test]
    fn test_public_and_private_aggregation_emit_one_edge() {
        let (mut model, hierarchy) = fixture();
        let car = model.find("proj", "Car").unwrap();
        model.get_mut(car).private_aggregations.insert("proj.Engine".to_string());

        let options = RenderingOptions {
            show_aggregations: true,
            aggregate_private_members: true,
            ..Default::default()
        };
        let out = PlantUmlRenderer::new(&options).render(&model, &hierarchy);
        assert_eq!(out.matches("\"proj.Car\" o-- \"proj.Engine\"").count(), 1);
    }

    #[test]
    fn test_title_notes_and_generics() {
        let (mut model, hierarchy) = fixture();
        let stack = model.get_or_insert("proj", "Stack");
        let record = model.get_mut(stack);
        record.kind = Some(TypeKind::Struct);
        record.type_parameters = vec![TypeParameter { name: "T".to_string(), constraint: "any".to_string() }];

        let options = RenderingOptions {
            title: Some("Cars".to_string()),
            notes: Some("generated".to_string()),
            ..Default::default()
        };
        let out = PlantUmlRenderer::new(&options).render(&model, &hierarchy);
        assert!(out.starts_with("@startuml\ntitle Cars\nlegend\ngenerated\nend legend\n"));
        assert!(out.contains("class Stack<T any> << (S,Aquamarine) >> {"));
    }

    #[test]
    fn test_function_buckets_only_when_enabled() {
        let (mut model, hierarchy) = fixture();
        let bucket = model.get_or_insert("proj", "General");
        let record = model.get_mut(bucket);
        record.kind = Some(TypeKind::Functions);
        record.methods = vec![method("Run", vec![], &[])];

        let hidden = RenderingOptions::default();
        assert!(!PlantUmlRenderer::new(&hidden).render(&model, &hierarchy).contains("General"));

        let shown = RenderingOptions { show_functions: true, ..Default::default() };
        let out = PlantUmlRenderer::new(&shown).render(&model, &hierarchy);
        assert!(out.contains("class General << (F,LightGreen) >> {"));
    }

    #[test]
    fn test_nested_namespaces_skip_empty() {
        let mut model = EntityModel::new();
        let id = model.get_or_insert("proj.a.b", "Deep");
        model.get_mut(id).kind = Some(TypeKind::Struct);

        let mut hierarchy = PackageHierarchy::new(vec![PathBuf::from("/src/proj")]);
        hierarchy.node_for(Path::new("/src/proj/a/b")).unwrap();
        hierarchy.node_for(Path::new("/src/proj/empty")).unwrap();

        let options = RenderingOptions::default();
        let out = PlantUmlRenderer::new(&options).render(&model, &hierarchy);
        assert!(out.contains(
            "namespace proj {\n    namespace proj.a {\n        namespace proj.a.b {\n            class Deep"
        ));
        assert!(!out.contains("proj.empty"));
    }
}
