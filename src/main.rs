use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use csharp_refactor::config::{load_from_path, run_on_file, RefactorConfig};
use csharp_refactor::mapping::MappingDetector;
use csharp_refactor::observer::{Observer, TracingObserver};
use csharp_refactor::query::{SearchContext, Selectable};
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "csharp-refactor")]
#[command(about = "Structural query, rewrite and property mapping for C# sources", long_about = None)]
#[command(version)]
struct Cli {
    /// Log engine events (debug level unless RUST_LOG says otherwise)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a refactoring config to files or directories
    Apply {
        /// Refactoring config (.toml or .json)
        #[arg(short, long)]
        config: PathBuf,

        /// Files or directories to process
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Dry run - show what would be changed without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// List methods, classes, members, return statements or the guarded
    /// statement paths of one method
    Query {
        file: PathBuf,

        #[command(flatten)]
        target: QueryTarget,

        /// Exact name (method, class or member); enclosing method for --returns
        #[arg(long)]
        name: Option<String>,

        /// Only public declarations
        #[arg(long)]
        public: bool,
    },

    /// Check a refactoring config without touching any file
    ValidateConfig { config: PathBuf },

    /// Suggest mapping rules by comparing legacy and new code
    SuggestMappings { old: PathBuf, new: PathBuf },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct QueryTarget {
    #[arg(long)]
    methods: bool,
    #[arg(long)]
    classes: bool,
    #[arg(long)]
    members: bool,
    #[arg(long)]
    returns: bool,
    /// Statements of the method given by --name with the conditions guarding them
    #[arg(long, requires = "name")]
    paths: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Apply {
            config,
            paths,
            dry_run,
            diff,
        } => cmd_apply(&config, &paths, dry_run, diff),

        Commands::Query {
            file,
            target,
            name,
            public,
        } => cmd_query(&file, &target, name.as_deref(), public),

        Commands::ValidateConfig { config } => cmd_validate_config(&config),

        Commands::SuggestMappings { old, new } => cmd_suggest_mappings(&old, &new),
    }
}

/// Files under `paths` accepted by the config's patterns, sorted.
fn discover_files(config: &RefactorConfig, paths: &[PathBuf]) -> Result<Vec<(PathBuf, PathBuf)>> {
    let mut files = Vec::new();
    for root in paths {
        if root.is_file() {
            let parent = root.parent().map(Path::to_path_buf).unwrap_or_default();
            files.push((parent, root.clone()));
            continue;
        }
        for entry in WalkDir::new(root) {
            let entry = entry.with_context(|| format!("walking {}", root.display()))?;
            if entry.file_type().is_file() && config.matches_file(entry.path()) {
                files.push((root.clone(), entry.path().to_path_buf()));
            }
        }
    }
    files.sort_by(|a, b| a.1.cmp(&b.1));
    files.dedup_by(|a, b| a.1 == b.1);
    Ok(files)
}

/// Helper: Show unified diff between original and modified content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (refactored)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}

fn cmd_apply(config_path: &Path, paths: &[PathBuf], dry_run: bool, show_diff: bool) -> Result<()> {
    let config = load_from_path(config_path)?;
    let observer: Arc<dyn Observer> = Arc::new(TracingObserver);

    if !config.meta.name.is_empty() {
        println!("Config: {}", config.meta.name.bold());
    }
    if dry_run {
        println!("{}", "[DRY RUN - no files will be written]".cyan());
    }

    let files = discover_files(&config, paths)?;
    if files.is_empty() {
        println!("{}", "No matching files found".yellow());
        return Ok(());
    }

    let mut total_changed = 0;
    let mut total_unchanged = 0;
    let mut total_failed = 0;

    for (root, file) in &files {
        match run_on_file(&config, root, file, dry_run, observer.clone()) {
            Ok(report) if !report.is_success() => {
                total_failed += 1;
                eprintln!(
                    "{} {}: {}",
                    "✗".red(),
                    file.display(),
                    report.failure.as_deref().unwrap_or("failed")
                );
                for change in &report.change_log {
                    eprintln!("  committed before failure: {}", change.dimmed());
                }
            }
            Ok(report) if report.changed() => {
                total_changed += 1;
                println!("{} {}", "✓".green(), file.display());
                for change in &report.change_log {
                    println!("  {change}");
                }
                if show_diff {
                    display_diff(file, &report.original, &report.text);
                }
            }
            Ok(_) => {
                total_unchanged += 1;
                println!("{} {}: unchanged", "○".yellow(), file.display());
            }
            Err(e) => {
                total_failed += 1;
                eprintln!("{} {}: Error - {}", "✗".red(), file.display(), e);
            }
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} changed", format!("{}", total_changed).green());
    println!("  {} unchanged", format!("{}", total_unchanged).yellow());
    println!("  {} failed", format!("{}", total_failed).red());

    if total_failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn print_matches<T: Selectable>(file: &Path, items: &[T]) {
    for item in items {
        println!(
            "{}:{}  {}",
            file.display(),
            item.node().line,
            item.describe()
        );
    }
    println!("{}", format!("{} match(es)", items.len()).dimmed());
}

fn cmd_query(file: &Path, target: &QueryTarget, name: Option<&str>, public: bool) -> Result<()> {
    let text =
        fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let ctx = SearchContext::parse(&text)
        .with_context(|| format!("parsing {}", file.display()))?
        .with_observer(Arc::new(TracingObserver));

    if target.methods {
        let mut query = ctx.find_methods();
        if let Some(name) = name {
            query = query.with_name(name)?;
        }
        if public {
            query = query.is_public();
        }
        print_matches(file, &query.execute());
    } else if target.classes {
        let mut query = ctx.find_classes();
        if let Some(name) = name {
            query = query.with_name(name)?;
        }
        if public {
            query = query.is_public();
        }
        print_matches(file, &query.execute());
    } else if target.members {
        let mut query = ctx.find_members();
        if let Some(name) = name {
            query = query.with_name(name)?;
        }
        if public {
            query = query.is_public();
        }
        print_matches(file, &query.execute());
    } else if target.paths {
        let method = name.unwrap_or_default();
        let paths = ctx.find_all_conditional_paths(method)?;
        for path in &paths {
            let guards: Vec<String> = path.conditions.iter().map(ToString::to_string).collect();
            let guards = if guards.is_empty() {
                "always".to_string()
            } else {
                guards.join(" > ")
            };
            println!(
                "{}:{}  {}  {}",
                file.display(),
                path.statement.line,
                path.statement.text.lines().next().unwrap_or_default().trim(),
                guards.dimmed()
            );
        }
        println!("{}", format!("{} statement(s)", paths.len()).dimmed());
    } else {
        let mut query = ctx.find_returns();
        if let Some(name) = name {
            query = query.in_method(name)?;
        }
        print_matches(file, &query.execute());
    }
    Ok(())
}

fn cmd_validate_config(path: &Path) -> Result<()> {
    let config = load_from_path(path)?;
    println!("{} {}", "✓".green(), path.display());
    println!("  {} transformation(s)", config.transformations.len());

    if let Some(mapping) = &config.mapping {
        println!(
            "  {} mapping rule(s), mode {}",
            mapping.rules.len(),
            mapping.mode
        );
        let mut engine = csharp_refactor::mapping::MappingEngine::new()
            .with_options(mapping.options());
        engine.add_rules(mapping.rules.iter().cloned())?;
        for issue in engine.validate() {
            println!("  {} {}", "!".yellow(), issue);
        }
    }
    Ok(())
}

fn cmd_suggest_mappings(old: &Path, new: &Path) -> Result<()> {
    let old_code = fs::read_to_string(old).with_context(|| format!("reading {}", old.display()))?;
    let new_code = fs::read_to_string(new).with_context(|| format!("reading {}", new.display()))?;

    let rules = MappingDetector::new()
        .with_observer(Arc::new(TracingObserver))
        .suggest(&old_code, &new_code);
    if rules.is_empty() {
        println!("{}", "No mapping suggestions".yellow());
        return Ok(());
    }
    for rule in &rules {
        println!("[[mapping.rules]]");
        println!("from = {:?}", rule.property_name);
        println!("to = {:?}", rule.target_path);
        if let Some(description) = &rule.description {
            println!("# {description}");
        }
        println!();
    }
    Ok(())
}
