//! Entity model - arena of type records keyed by (package path, name)

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Lowercase first character. Empty names are never private.
pub fn is_private_name(name: &str) -> bool {
    name.chars().next().map(|c| c.is_lowercase()).unwrap_or(false)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TypeKind {
    Struct,
    Interface,
    Alias,
    /// Synthetic bucket of free functions
    Functions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    /// Empty for embedded fields
    pub name: String,
    /// Display form, current package unqualified
    #[serde(rename = "type")]
    pub ty: String,
    /// Qualified against the declaring package
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_type: Option<String>,
}

impl Field {
    pub fn is_private(&self) -> bool {
        is_private_name(&self.name)
    }

    fn signature_type(&self) -> &str {
        self.full_type.as_deref().unwrap_or(&self.ty)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Method {
    pub name: String,
    pub parameters: Vec<Field>,
    pub return_values: Vec<String>,
    pub full_return_values: Vec<String>,
    pub package_path: String,
}

impl Method {
    pub fn is_private(&self) -> bool {
        is_private_name(&self.name)
    }

    /// Same name, same parameter types in order, same return types in order.
    /// Parameter names are ignored.
    pub fn same_signature(&self, other: &Method) -> bool {
        self.name == other.name
            && self.parameters.len() == other.parameters.len()
            && self
                .parameters
                .iter()
                .zip(&other.parameters)
                .all(|(a, b)| a.signature_type() == b.signature_type())
            && self.signature_returns() == other.signature_returns()
    }

    fn signature_returns(&self) -> &[String] {
        if self.full_return_values.len() == self.return_values.len() {
            &self.full_return_values
        } else {
            &self.return_values
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeParameter {
    pub name: String,
    pub constraint: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeRecord {
    pub name: String,
    pub package_path: String,
    /// `None` while the record is a forward-declared placeholder
    pub kind: Option<TypeKind>,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
    pub composition: BTreeSet<String>,
    pub extends: BTreeSet<String>,
    pub aggregations: BTreeSet<String>,
    pub private_aggregations: BTreeSet<String>,
    pub type_parameters: Vec<TypeParameter>,
}

impl TypeRecord {
    fn placeholder(package_path: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            package_path: package_path.to_string(),
            kind: None,
            fields: Vec::new(),
            methods: Vec::new(),
            composition: BTreeSet::new(),
            extends: BTreeSet::new(),
            aggregations: BTreeSet::new(),
            private_aggregations: BTreeSet::new(),
            type_parameters: Vec::new(),
        }
    }

    /// `pkg.path.Name`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.package_path, self.name)
    }
}

/// Ordered by (name, package, alias_of)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Alias {
    pub name: String,
    pub package_name: String,
    pub alias_of: String,
}

impl Alias {
    pub fn new(package: &str, name: &str, alias_of: String) -> Self {
        let name = if crate::resolver::is_primitive(name) {
            name.to_string()
        } else {
            format!("{package}.{name}")
        };
        Self {
            name,
            package_name: package.to_string(),
            alias_of,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(usize);

/// Every type record of one analysis session
#[derive(Debug, Default, Serialize)]
pub struct EntityModel {
    records: Vec<TypeRecord>,
    #[serde(skip)]
    index: HashMap<(String, String), TypeId>,
    aliases: Vec<Alias>,
}

impl EntityModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// The single mutation entry point for records: fetch, or create a placeholder
    pub fn get_or_insert(&mut self, package_path: &str, name: &str) -> TypeId {
        let key = (package_path.to_string(), name.to_string());
        if let Some(id) = self.index.get(&key) {
            return *id;
        }
        let id = TypeId(self.records.len());
        self.records.push(TypeRecord::placeholder(package_path, name));
        self.index.insert(key, id);
        id
    }

    pub fn find(&self, package_path: &str, name: &str) -> Option<TypeId> {
        self.index
            .get(&(package_path.to_string(), name.to_string()))
            .copied()
    }

    /// Look up `pkg.path.Name`; the last dot separates package from name
    pub fn find_qualified(&self, qualified: &str) -> Option<TypeId> {
        let (package, name) = qualified.rsplit_once('.')?;
        self.find(package, name)
    }

    pub fn get(&self, id: TypeId) -> &TypeRecord {
        &self.records[id.0]
    }

    pub fn get_mut(&mut self, id: TypeId) -> &mut TypeRecord {
        &mut self.records[id.0]
    }

    pub fn ids(&self) -> impl Iterator<Item = TypeId> {
        (0..self.records.len()).map(TypeId)
    }

    /// Records grouped by package path, each group sorted by type name
    pub fn packages(&self) -> BTreeMap<&str, Vec<&TypeRecord>> {
        let mut packages: BTreeMap<&str, Vec<&TypeRecord>> = BTreeMap::new();
        for record in &self.records {
            packages.entry(record.package_path.as_str()).or_default().push(record);
        }
        for records in packages.values_mut() {
            records.sort_by(|a, b| a.name.cmp(&b.name));
        }
        packages
    }

    pub fn add_alias(&mut self, alias: Alias) {
        self.aliases.push(alias);
    }

    pub fn aliases(&self) -> &[Alias] {
        &self.aliases
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str, ty: &str) -> Field {
        Field {
            name: name.to_string(),
            ty: ty.to_string(),
            full_type: Some(ty.to_string()),
        }
    }

    fn method(name: &str, params: Vec<Field>, returns: &[&str]) -> Method {
        let returns: Vec<String> = returns.iter().map(|r| r.to_string()).collect();
        Method {
            name: name.to_string(),
            parameters: params,
            full_return_values: returns.clone(),
            return_values: returns,
            package_path: "p".to_string(),
        }
    }

    #[test]
    fn test_signature_equality_ignores_parameter_names() {
        let a = method("foo", vec![param("a", "int"), param("b", "string")], &["error"]);
        let b = method("foo", vec![param("x", "int"), param("y", "string")], &["error"]);
        assert!(a.same_signature(&b));
    }

    #[test]
    fn test_signature_equality_is_order_sensitive() {
        let a = method("foo", vec![param("a", "int"), param("b", "string")], &["error"]);
        let b = method("foo", vec![param("b", "string"), param("a", "int")], &["error"]);
        assert!(!a.same_signature(&b));
    }

    #[test]
    fn test_signature_equality_checks_returns_and_name() {
        let a = method("Speak", vec![], &["string"]);
        assert!(!a.same_signature(&method("Speak", vec![], &["int"])));
        assert!(!a.same_signature(&method("Speak", vec![], &["string", "error"])));
        assert!(!a.same_signature(&method("Talk", vec![], &["string"])));
    }

    #[test]
    fn test_signature_uses_full_types() {
        let mut a = method("Use", vec![param("s", "Sound")], &[]);
        let mut b = method("Use", vec![param("s", "Sound")], &[]);
        a.parameters[0].full_type = Some("a.Sound".to_string());
        b.parameters[0].full_type = Some("b.Sound".to_string());
        assert!(!a.same_signature(&b));
    }

    #[test]
    fn test_get_or_insert_is_idempotent() {
        let mut model = EntityModel::new();
        let first = model.get_or_insert("proj.car", "Car");
        let second = model.get_or_insert("proj.car", "Car");
        let other = model.get_or_insert("proj.boat", "Car");
        assert_eq!(first, second);
        assert_ne!(first, other);
        assert_eq!(model.len(), 2);
        assert!(model.get(first).kind.is_none());
        assert_eq!(model.find_qualified("proj.car.Car"), Some(first));
        assert_eq!(model.get(other).qualified_name(), "proj.boat.Car");
    }

    #[test]
    fn test_packages_sorted_by_name() {
        let mut model = EntityModel::new();
        model.get_or_insert("p", "Zeta");
        model.get_or_insert("p", "Alpha");
        model.get_or_insert("a", "Mid");
        let packages = model.packages();
        let keys: Vec<_> = packages.keys().copied().collect();
        assert_eq!(keys, vec!["a", "p"]);
        let names: Vec<_> = packages["p"].iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
    }

    #[test]
    fn test_is_private_name() {
        assert!(is_private_name("engine"));
        assert!(!is_private_name("Engine"));
        assert!(!is_private_name(""));
    }

    #[test]
    fn test_alias_ordering() {
        let mut aliases = vec![
            Alias::new("q", "ID", "__builtin__.int".to_string()),
            Alias::new("p", "ID", "__builtin__.int".to_string()),
        ];
        aliases.sort();
        assert_eq!(aliases[0].name, "p.ID");
        assert_eq!(aliases[1].name, "q.ID");
    }
}
