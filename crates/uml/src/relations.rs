//! Structural interface conformance, run once the whole model is built

use crate::model::{EntityModel, Method, TypeId, TypeKind};
use std::collections::HashSet;
use tracing::debug;

/// Add every interface a struct structurally implements to its `extends`.
/// Returns the number of edges added.
pub fn resolve_implementations(model: &mut EntityModel) -> usize {
    let interfaces: Vec<(String, Vec<Method>)> = model
        .ids()
        .filter(|id| model.get(*id).kind == Some(TypeKind::Interface))
        .map(|id| (model.get(id).qualified_name(), method_set(model, id)))
        .filter(|(_, methods)| !methods.is_empty())
        .collect();

    let structs: Vec<TypeId> = model
        .ids()
        .filter(|id| model.get(*id).kind == Some(TypeKind::Struct))
        .collect();

    let mut added = 0;
    for struct_id in structs {
        for (qualified, required) in &interfaces {
            let record = model.get(struct_id);
            let conforms = required
                .iter()
                .all(|wanted| record.methods.iter().any(|have| have.same_signature(wanted)));
            if conforms && model.get_mut(struct_id).extends.insert(qualified.clone()) {
                debug!(implementor = %model.get(struct_id).qualified_name(), interface = %qualified, "implements");
                added += 1;
            }
        }
    }
    added
}

/// Declared methods plus those of embedded model interfaces, flattened
pub fn method_set(model: &EntityModel, interface: TypeId) -> Vec<Method> {
    let mut methods = Vec::new();
    let mut visited = HashSet::new();
    collect_methods(model, interface, &mut visited, &mut methods);
    methods
}

fn collect_methods(
    model: &EntityModel,
    id: TypeId,
    visited: &mut HashSet<TypeId>,
    out: &mut Vec<Method>,
) {
    if !visited.insert(id) {
        return;
    }
    let record = model.get(id);
    for method in &record.methods {
        if !out.iter().any(|m| m.same_signature(method)) {
            out.push(method.clone());
        }
    }
    for embedded in &record.composition {
        if let Some(inner) = model.find_qualified(embedded) {
            if model.get(inner).kind == Some(TypeKind::Interface) {
                collect_methods(model, inner, visited, out);
            }
        }
    }
}
