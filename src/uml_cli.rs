//! diagram / model subcommands

use crate::config::DiagramConfig;
use anyhow::Context;
use clap::Args;
use std::path::PathBuf;
use tracing::info;
use uml::{Analysis, ClassAnalyzer, RenderingOptions};

#[derive(Args)]
pub struct DiagramArgs {
    /// Directories to analyze
    #[arg(required = true)]
    dirs: Vec<PathBuf>,
    /// Walk subdirectories
    #[arg(short, long)]
    recursive: bool,
    /// Directory names to skip (comma separated)
    #[arg(long, value_delimiter = ',')]
    ignore: Vec<String>,
    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// YAML config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Diagram title
    #[arg(long)]
    title: Option<String>,
    /// Legend text
    #[arg(long)]
    notes: Option<String>,
    /// Skip packages nested deeper than this
    #[arg(long)]
    max_depth: Option<usize>,
    /// Drop every connection before applying --show-* flags
    #[arg(long)]
    hide_connections: bool,
    #[arg(long)]
    show_aggregations: bool,
    #[arg(long)]
    show_compositions: bool,
    #[arg(long)]
    show_implementations: bool,
    #[arg(long)]
    show_aliases: bool,
    #[arg(long)]
    show_connection_labels: bool,
    /// Unexported fields count towards aggregations
    #[arg(long)]
    aggregate_private_members: bool,
    #[arg(long)]
    hide_private_members: bool,
    #[arg(long)]
    hide_fields: bool,
    #[arg(long)]
    hide_methods: bool,
    /// Render free functions grouped by category
    #[arg(long)]
    show_functions: bool,
    /// Legend listing the active options
    #[arg(long)]
    show_options_as_note: bool,
}

impl DiagramArgs {
    /// Config file, then environment, then flags
    fn resolve_config(&self) -> anyhow::Result<DiagramConfig> {
        let mut config = DiagramConfig::load(self.config.as_deref())?;
        config.apply_env();

        if !self.ignore.is_empty() {
            config.ignore = self.ignore.clone();
        }
        if self.max_depth.is_some() {
            config.max_depth = self.max_depth;
        }

        let options = &mut config.options;
        if self.title.is_some() {
            options.title = self.title.clone();
        }
        if self.notes.is_some() {
            options.notes = self.notes.clone();
        }
        if self.hide_connections {
            options.hide_connections();
        }
        options.show_aggregations |= self.show_aggregations;
        options.show_compositions |= self.show_compositions;
        options.show_implementations |= self.show_implementations;
        options.show_aliases |= self.show_aliases;
        options.show_connection_labels |= self.show_connection_labels;
        options.aggregate_private_members |= self.aggregate_private_members;
        options.hide_private_members |= self.hide_private_members;
        options.hide_fields |= self.hide_fields;
        options.hide_methods |= self.hide_methods;
        options.show_functions |= self.show_functions;
        options.show_options_as_note |= self.show_options_as_note;

        Ok(config)
    }
}

#[derive(Args)]
pub struct ModelArgs {
    /// Directories to analyze
    #[arg(required = true)]
    dirs: Vec<PathBuf>,
    /// Walk subdirectories
    #[arg(short, long)]
    recursive: bool,
    /// Directory names to skip (comma separated)
    #[arg(long, value_delimiter = ',')]
    ignore: Vec<String>,
    /// JSON output
    #[arg(long)]
    json: bool,
}

pub fn run_diagram(args: DiagramArgs) -> anyhow::Result<()> {
    let config = args.resolve_config()?;
    let analysis = analyze(&args.dirs, args.recursive, &config)?;
    let diagram = analysis.render(&config.options);

    match &args.output {
        Some(path) => {
            std::fs::write(path, &diagram)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Diagram written to {}", path.display());
        }
        None => print!("{diagram}"),
    }
    Ok(())
}

pub fn run_model(args: ModelArgs) -> anyhow::Result<()> {
    let mut config = DiagramConfig::default();
    config.apply_env();
    if !args.ignore.is_empty() {
        config.ignore = args.ignore.clone();
    }
    let analysis = analyze(&args.dirs, args.recursive, &config)?;
    let model = analysis.model();

    if args.json {
        println!("{}", serde_json::to_string_pretty(model)?);
        return Ok(());
    }

    for (package, records) in model.packages() {
        println!("{package} ({} types)", records.len());
        for record in records {
            let kind = record
                .kind
                .map(|k| format!("{k:?}"))
                .unwrap_or_else(|| "Unknown".to_string());
            println!(
                "  {:<10} {} ({} fields, {} methods)",
                kind,
                record.name,
                record.fields.len(),
                record.methods.len()
            );
        }
    }
    println!("Aliases: {}", model.aliases().len());
    Ok(())
}

fn analyze(dirs: &[PathBuf], recursive: bool, config: &DiagramConfig) -> anyhow::Result<Analysis> {
    info!("Analyzing {} root(s)", dirs.len());
    let analysis = ClassAnalyzer::new(dirs.iter().cloned())
        .recursive(recursive)
        .with_ignored(config.ignore.iter().cloned())
        .with_max_depth(config.max_depth)
        .with_categories(config.categories.clone())
        .analyze()
        .context("Analysis failed")?;
    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: DiagramArgs,
    }

    fn parse(argv: &[&str]) -> DiagramArgs {
        TestCli::parse_from(std::iter::once("gouml").chain(argv.iter().copied())).args
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = parse(&["proj", "--show-aggregations", "--title", "Cars", "--ignore", "vendor,gen"]);
        let config = args.resolve_config().unwrap();
        assert!(config.options.show_aggregations);
        assert!(config.options.show_compositions);
        assert_eq!(config.options.title.as_deref(), Some("Cars"));
        assert_eq!(config.ignore, vec!["vendor", "gen"]);
    }

    #[test]
    fn test_hide_connections_then_show() {
        let args = parse(&["proj", "--hide-connections", "--show-aliases"]);
        let options: RenderingOptions = args.resolve_config().unwrap().options;
        assert!(options.show_aliases);
        assert!(!options.show_compositions);
        assert!(!options.show_implementations);
        assert!(!options.show_aggregations);
    }
}
