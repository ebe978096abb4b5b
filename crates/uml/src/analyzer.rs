use crate::builder::ModelBuilder;
use crate::classify::{Category, FunctionClassifier};
use crate::hierarchy::PackageHierarchy;
use crate::model::EntityModel;
use crate::options::RenderingOptions;
use crate::relations::resolve_implementations;
use crate::render::PlantUmlRenderer;
use goparse::{go_files, GoParser, ParseError, SourceFile};
use rayon::prelude::*;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum UmlError {
    #[error("Directory not found: {0}")]
    RootNotFound(PathBuf),
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Go grammar unavailable: {0}")]
    Grammar(String),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, UmlError>;

/// One analysis session over a set of root directories
pub struct ClassAnalyzer {
    roots: Vec<PathBuf>,
    recursive: bool,
    ignored: Vec<String>,
    max_depth: Option<usize>,
    categories: Vec<Category>,
}

impl ClassAnalyzer {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            recursive: false,
            ignored: Vec::new(),
            max_depth: None,
            categories: Vec::new(),
        }
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Directory names (or paths) never descended into
    pub fn with_ignored<I, S>(mut self, ignored: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored = ignored.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = categories;
        self
    }

    /// Scan, parse, build and resolve. Fails on the first missing root,
    /// unparsable file or I/O error.
    pub fn analyze(&self) -> Result<Analysis> {
        let roots = self.validate_roots()?;
        let mut hierarchy = PackageHierarchy::new(roots.clone()).with_max_depth(self.max_depth);

        let mut jobs: Vec<(String, PathBuf)> = Vec::new();
        for dir in self.directories(&roots)? {
            let files = go_files(&dir)?;
            if files.is_empty() {
                continue;
            }
            let node = match hierarchy.node_for(&dir) {
                Ok(id) => hierarchy.node(id),
                Err(e) => {
                    warn!("Skipping {}: {}", dir.display(), e);
                    continue;
                }
            };
            let package = node.full_path.clone();
            debug!(package = %package, name = %node.short_name, files = files.len(), "queued package");
            jobs.extend(files.into_iter().map(|file| (package.clone(), file)));
        }
        info!("Parsing {} Go files", jobs.len());

        let parsed: Vec<(String, SourceFile)> = jobs
            .par_iter()
            .map_init(GoParser::new, |parser, (package, path)| -> Result<(String, SourceFile)> {
                let parser = parser
                    .as_mut()
                    .map_err(|e| UmlError::Grammar(e.to_string()))?;
                debug!("Parsing {}", path.display());
                Ok((package.clone(), parser.parse_file(path)?))
            })
            .collect::<Result<_>>()?;

        let classifier = FunctionClassifier::new(self.categories.clone());
        let mut model = EntityModel::new();
        let packages: BTreeSet<&str> = jobs.iter().map(|(package, _)| package.as_str()).collect();
        let mut builder =
            ModelBuilder::new(&mut model, &classifier).with_known_packages(packages);
        for (package, file) in &parsed {
            builder.add_file(package, file);
        }

        let implementations = resolve_implementations(&mut model);
        info!(
            "Analyzed {} types in {} packages, {} implementations",
            model.len(),
            hierarchy.len(),
            implementations
        );

        Ok(Analysis { model, hierarchy })
    }

    fn validate_roots(&self) -> Result<Vec<PathBuf>> {
        self.roots
            .iter()
            .map(|root| {
                if !root.exists() {
                    return Err(UmlError::RootNotFound(root.clone()));
                }
                if !root.is_dir() {
                    return Err(UmlError::NotADirectory(root.clone()));
                }
                Ok(root.canonicalize()?)
            })
            .collect()
    }

    /// Every directory to scan, in walk order, each at most once
    fn directories(&self, roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut seen = HashSet::new();
        let mut dirs = Vec::new();

        for root in roots {
            if !self.recursive {
                if seen.insert(root.clone()) {
                    dirs.push(root.clone());
                }
                continue;
            }

            let walker = WalkDir::new(root)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !self.is_ignored(e));
            for entry in walker {
                let entry = entry?;
                if entry.file_type().is_dir() && seen.insert(entry.path().to_path_buf()) {
                    dirs.push(entry.into_path());
                }
            }
        }
        Ok(dirs)
    }

    fn is_ignored(&self, entry: &DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        name.starts_with('.')
            || self
                .ignored
                .iter()
                .any(|ignored| name == ignored.as_str() || entry.path().ends_with(Path::new(ignored)))
    }
}

/// Finished model plus the namespace tree it renders into
pub struct Analysis {
    model: EntityModel,
    hierarchy: PackageHierarchy,
}

impl Analysis {
    pub fn model(&self) -> &EntityModel {
        &self.model
    }

    pub fn hierarchy(&self) -> &PackageHierarchy {
        &self.hierarchy
    }

    pub fn render(&self, options: &RenderingOptions) -> String {
        PlantUmlRenderer::new(options).render(&self.model, &self.hierarchy)
    }
}
