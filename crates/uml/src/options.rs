use serde::{Deserialize, Serialize};

/// What a render call includes. Passed per call, never global.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderingOptions {
    pub title: Option<String>,
    pub notes: Option<String>,
    pub show_aggregations: bool,
    pub show_compositions: bool,
    pub show_implementations: bool,
    pub show_aliases: bool,
    pub show_connection_labels: bool,
    /// Count unexported fields towards aggregation edges
    pub aggregate_private_members: bool,
    pub hide_private_members: bool,
    pub hide_fields: bool,
    pub hide_methods: bool,
    pub show_functions: bool,
    pub show_options_as_note: bool,
}

impl Default for RenderingOptions {
    fn default() -> Self {
        Self {
            title: None,
            notes: None,
            show_aggregations: false,
            show_compositions: true,
            show_implementations: true,
            show_aliases: true,
            show_connection_labels: false,
            aggregate_private_members: false,
            hide_private_members: false,
            hide_fields: false,
            hide_methods: false,
            show_functions: false,
            show_options_as_note: false,
        }
    }
}

impl RenderingOptions {
    /// Drop every connection kind
    pub fn hide_connections(&mut self) {
        self.show_aggregations = false;
        self.show_compositions = false;
        self.show_implementations = false;
        self.show_aliases = false;
    }

    /// `(name, value)` for each boolean option, in legend order
    pub fn flags(&self) -> [(&'static str, bool); 11] {
        [
            ("Aggregations", self.show_aggregations),
            ("Compositions", self.show_compositions),
            ("Implementations", self.show_implementations),
            ("Aliases", self.show_aliases),
            ("Connection Labels", self.show_connection_labels),
            ("Aggregate Private Members", self.aggregate_private_members),
            ("Hide Private Members", self.hide_private_members),
            ("Fields", !self.hide_fields),
            ("Methods", !self.hide_methods),
            ("Functions", self.show_functions),
            ("Options As Note", self.show_options_as_note),
        ]
    }
}
