use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to load Go grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),
    #[error("tree-sitter produced no tree for {0}")]
    NoTree(PathBuf),
    #[error("Syntax error in {path} at {line}:{column}")]
    Syntax {
        path: PathBuf,
        line: usize,
        column: usize,
    },
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ParseError>;
