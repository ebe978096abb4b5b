//! Free-function classification into display buckets

use serde::{Deserialize, Serialize};

pub const DEFAULT_CATEGORY: &str = "General";

/// Named bucket and the substrings that select it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Category {
    pub fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Buckets functions by case-insensitive keyword match.
/// Categories are tried in declaration order; the first hit wins.
#[derive(Debug, Clone, Default)]
pub struct FunctionClassifier {
    categories: Vec<Category>,
}

impl FunctionClassifier {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    pub fn classify(&self, function_name: &str) -> &str {
        let name = function_name.to_lowercase();
        self.categories
            .iter()
            .find(|category| {
                category
                    .keywords
                    .iter()
                    .filter(|k| !k.is_empty())
                    .any(|k| name.contains(&k.to_lowercase()))
            })
            .map(|category| category.name.as_str())
            .unwrap_or(DEFAULT_CATEGORY)
    }
}
