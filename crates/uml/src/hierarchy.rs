//! Package hierarchy - scanned directories as a tree of dotted namespaces

use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Directories the hierarchy refuses. Never fatal for an analysis: the
/// caller skips the directory.
#[derive(Debug, Error)]
pub enum HierarchyError {
    #[error("{0} is not inside any analyzed root")]
    OutsideRoots(PathBuf),

    #[error("{path} is {depth} packages deep, limit is {max}")]
    TooDeep { path: String, depth: usize, max: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId(usize);

#[derive(Debug, Clone)]
pub struct PackageNode {
    /// Last path segment
    pub short_name: String,
    /// Dotted path, e.g. `project.internal.store`
    pub full_path: String,
    pub parent: Option<PackageId>,
    /// Keyed by the child's full path
    pub children: BTreeMap<String, PackageId>,
    pub depth: usize,
}

pub struct PackageHierarchy {
    roots: Vec<PathBuf>,
    /// Dotted prefix per root, parallel to `roots`
    prefixes: Vec<String>,
    max_depth: Option<usize>,
    nodes: Vec<PackageNode>,
    by_dir: HashMap<PathBuf, PackageId>,
    by_path: HashMap<String, PackageId>,
}

impl PackageHierarchy {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        let prefixes = root_prefixes(&roots);
        Self {
            roots,
            prefixes,
            max_depth: None,
            nodes: Vec::new(),
            by_dir: HashMap::new(),
            by_path: HashMap::new(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Node for `dir`, creating it and any missing ancestors.
    /// The same directory always yields the same node.
    pub fn node_for(&mut self, dir: &Path) -> Result<PackageId, HierarchyError> {
        if let Some(id) = self.by_dir.get(dir) {
            return Ok(*id);
        }

        let full_path = self.dotted_path(dir)?;
        let depth = depth_of(&full_path);
        if let Some(max) = self.max_depth {
            if depth > max {
                return Err(HierarchyError::TooDeep { path: full_path, depth, max });
            }
        }

        let id = self.node_for_path(&full_path);
        self.by_dir.insert(dir.to_path_buf(), id);
        Ok(id)
    }

    pub fn node(&self, id: PackageId) -> &PackageNode {
        &self.nodes[id.0]
    }

    pub fn find(&self, full_path: &str) -> Option<PackageId> {
        self.by_path.get(full_path).copied()
    }

    /// Parentless nodes, sorted by full path
    pub fn top_level(&self) -> Vec<PackageId> {
        let mut top: Vec<PackageId> = (0..self.nodes.len())
            .map(PackageId)
            .filter(|id| self.node(*id).parent.is_none())
            .collect();
        top.sort_by(|a, b| self.node(*a).full_path.cmp(&self.node(*b).full_path));
        top
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Prefix of the shortest root containing `dir`, then the relative
    /// components
    fn dotted_path(&self, dir: &Path) -> Result<String, HierarchyError> {
        let index = (0..self.roots.len())
            .filter(|i| dir.starts_with(&self.roots[*i]))
            .min_by_key(|i| self.roots[*i].components().count())
            .ok_or_else(|| HierarchyError::OutsideRoots(dir.to_path_buf()))?;

        let mut parts = vec![self.prefixes[index].clone()];
        // starts_with held above
        if let Ok(relative) = dir.strip_prefix(&self.roots[index]) {
            for component in relative.components() {
                if let Component::Normal(name) = component {
                    parts.push(sanitize(&name.to_string_lossy()));
                }
            }
        }
        Ok(parts.join("."))
    }

    fn node_for_path(&mut self, full_path: &str) -> PackageId {
        if let Some(id) = self.by_path.get(full_path) {
            return *id;
        }

        let parent = full_path
            .rsplit_once('.')
            .map(|(parent_path, _)| self.node_for_path(parent_path));

        let short_name = full_path
            .rsplit_once('.')
            .map_or(full_path, |(_, last)| last)
            .to_string();
        let id = PackageId(self.nodes.len());
        self.nodes.push(PackageNode {
            short_name,
            full_path: full_path.to_string(),
            parent,
            children: BTreeMap::new(),
            depth: depth_of(full_path),
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.insert(full_path.to_string(), id);
        }
        self.by_path.insert(full_path.to_string(), id);
        id
    }
}

/// Base name of each root, extended with leading components while another
/// root ends in the same names: `svc_a/model` and `svc_b/model` become
/// `svc_a.model` and `svc_b.model`. Depends only on the set of roots.
fn root_prefixes(roots: &[PathBuf]) -> Vec<String> {
    let names: Vec<Vec<String>> = roots
        .iter()
        .map(|root| {
            let names: Vec<String> = root
                .components()
                .filter_map(|c| match c {
                    Component::Normal(name) => Some(sanitize(&name.to_string_lossy())),
                    _ => None,
                })
                .collect();
            if names.is_empty() {
                vec!["root".to_string()]
            } else {
                names
            }
        })
        .collect();

    let suffix = |names: &[String], n: usize| names[names.len().saturating_sub(n)..].join(".");

    names
        .iter()
        .map(|own| {
            let mut n = 1;
            while n < own.len()
                && names
                    .iter()
                    .any(|other| other != own && suffix(other, n) == suffix(own, n))
            {
                n += 1;
            }
            suffix(own, n)
        })
        .collect()
}

fn sanitize(component: &str) -> String {
    component.replace('.', "_")
}

fn depth_of(full_path: &str) -> usize {
    full_path.matches('.').count() + 1
}
