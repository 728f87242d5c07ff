//! Command-line front end: inspect a domain snapshot, run ad-hoc traversals
//! and produce recommendation lists.
#![forbid(unsafe_code)]

#[path = "cli/ui.rs"]
mod ui;

use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use gremlite::{
    logging::init_logging, recommend::RecommenderRegistry, BatchRunner, DomainSnapshot, Element,
    ElementId, Graph, GraphError, GraphFactory, MemoryStore, PropertyValue, Query,
    RecommenderConfig, ScoreWeighting,
};
use serde::Serialize;
use serde_json::Value;

use ui::{format_duration, Theme, Ui};

#[derive(Parser, Debug)]
#[command(
    name = "gremlite",
    version,
    about = "Graph traversals and bookmark-based recommendations over a domain snapshot",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "GREMLITE_CONFIG",
        help = "Recommender configuration file (TOML)"
    )]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_name = "FILTER",
        help = "Log filter, e.g. info or gremlite=debug [default: config value]"
    )]
    log_level: Option<String>,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format"
    )]
    format: OutputFormat,

    #[arg(long, global = true, value_enum, default_value_t = Theme::Auto)]
    theme: Theme,

    #[arg(long, global = true, help = "Plain output without colours or spinners")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Vertex and edge counts of the graph built from a snapshot.
    Stats(SnapshotArgs),
    /// Run a traversal, e.g. `--start p-1 --steps out:bookmarked,in:bookmarked,distinct`.
    Traverse(TraverseCmd),
    /// Run recommender strategies and print what they would store.
    Recommend(RecommendCmd),
    /// List the registered recommender strategies.
    Strategies,
}

#[derive(Args, Debug)]
struct SnapshotArgs {
    #[arg(long, value_name = "FILE", help = "Domain snapshot (JSON)")]
    snapshot: PathBuf,
}

#[derive(Args, Debug)]
struct TraverseCmd {
    #[command(flatten)]
    source: SnapshotArgs,

    #[arg(
        long,
        value_name = "ID",
        value_delimiter = ',',
        help = "Start vertex ids; every vertex when omitted"
    )]
    start: Vec<String>,

    #[arg(
        long,
        value_name = "STEPS",
        default_value = "",
        help = "Comma-separated steps: out[:l|l], in, both, out_e, in_e, both_e, in_v, out_v, \
                id, properties, internal_properties, distinct, limit:N, exclude:id|id, \
                has:key=value, has_label:l|l"
    )]
    steps: String,
}

#[derive(Args, Debug)]
struct RecommendCmd {
    #[command(flatten)]
    source: SnapshotArgs,

    #[arg(
        long = "strategy",
        value_name = "NAME",
        help = "Strategy to run (repeatable) [default: config value]"
    )]
    strategies: Vec<String>,

    #[arg(long, value_name = "N", help = "Listings kept per profile")]
    top_n: Option<usize>,

    #[arg(long, value_enum, help = "Score weighting for graph strategies")]
    weighting: Option<ScoreWeighting>,

    #[arg(long, help = "Ignore listing approval, deletion and privacy flags")]
    ignore_visibility: bool,

    #[arg(long, value_name = "FILE", help = "Write results here instead of stdout")]
    output: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Csv,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let mut config = RecommenderConfig::load(cli.config.clone())?;
    let level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    init_logging(&level)?;
    let ui = Ui::new(cli.theme, cli.quiet);

    match cli.command {
        Command::Stats(args) => {
            let graph = load_graph(&ui, &args)?;
            let stats = graph.stats();
            match cli.format {
                OutputFormat::Text => {
                    ui.section(
                        "Graph",
                        [("vertices", stats.vertices), ("edges", stats.edges)],
                    );
                    ui.section(
                        "Vertex labels",
                        stats.vertex_labels.iter().map(|(l, n)| (l.as_str(), *n)),
                    );
                    ui.section(
                        "Edge labels",
                        stats.edge_labels.iter().map(|(l, n)| (l.as_str(), *n)),
                    );
                }
                OutputFormat::Json => print_json(&stats)?,
                OutputFormat::Csv => {
                    let mut writer = csv::Writer::from_writer(io::stdout());
                    writer.write_record(["metric", "value"])?;
                    writer.write_record(["vertices".to_owned(), stats.vertices.to_string()])?;
                    writer.write_record(["edges".to_owned(), stats.edges.to_string()])?;
                    for (label, n) in &stats.vertex_labels {
                        writer.write_record([format!("vertex:{label}"), n.to_string()])?;
                    }
                    for (label, n) in &stats.edge_labels {
                        writer.write_record([format!("edge:{label}"), n.to_string()])?;
                    }
                    writer.flush()?;
                }
            }
        }
        Command::Traverse(cmd) => {
            let graph = load_graph(&ui, &cmd.source)?;
            let mut query = if cmd.start.is_empty() {
                graph.query().vertices()
            } else {
                graph.query().v(cmd.start.iter().map(|raw| parse_id(raw)))
            };
            for token in split_list(&cmd.steps, ',') {
                query = apply_step(query, &token)?;
            }
            let results: Vec<Value> = query
                .to_list()?
                .iter()
                .map(|element| render(&graph, element))
                .collect::<Result<_, _>>()?;
            match cli.format {
                OutputFormat::Text => {
                    ui.list("Results", results.iter().map(value_text));
                    ui.info(&format!("{} element(s)", results.len()));
                }
                OutputFormat::Json => print_json(&results)?,
                OutputFormat::Csv => {
                    let mut writer = csv::Writer::from_writer(io::stdout());
                    writer.write_record(["element"])?;
                    for value in &results {
                        writer.write_record([value_text(value)])?;
                    }
                    writer.flush()?;
                }
            }
        }
        Command::Recommend(cmd) => {
            if !cmd.strategies.is_empty() {
                config.strategies = cmd.strategies.clone();
            }
            if let Some(top_n) = cmd.top_n {
                config.top_n = top_n;
            }
            if let Some(weighting) = cmd.weighting {
                config.weighting = weighting;
            }
            if cmd.ignore_visibility {
                config.respect_visibility = false;
            }
            run_recommend(&ui, cli.format, &cmd, config)?;
        }
        Command::Strategies => {
            let registry = RecommenderRegistry::with_builtins();
            match cli.format {
                OutputFormat::Json => print_json(&registry.names().collect::<Vec<_>>())?,
                _ => ui.list("Strategies", registry.names().map(str::to_owned)),
            }
        }
    }

    Ok(())
}

fn load_graph(ui: &Ui, args: &SnapshotArgs) -> Result<Graph, GraphError> {
    let task = ui.task(format!("Loading {}", args.snapshot.display()));
    let snapshot = DomainSnapshot::from_path(&args.snapshot)?;
    let graph = GraphFactory::build(&snapshot)?;
    task.finish();
    Ok(graph)
}

#[derive(Serialize)]
struct RecommendOutput<'a> {
    report: &'a gremlite::recommend::BatchReport,
    recommendations: Vec<gremlite::recommend::ProfileRecommendations>,
}

fn run_recommend(
    ui: &Ui,
    format: OutputFormat,
    cmd: &RecommendCmd,
    config: RecommenderConfig,
) -> Result<(), Box<dyn Error>> {
    let snapshot = DomainSnapshot::from_path(&cmd.source.snapshot)?;
    let store = MemoryStore::new();
    let runner = BatchRunner::new(config);

    let task = ui.task("Computing recommendations");
    let report = runner.run(&snapshot, Arc::new(store.clone()))?;
    let elapsed = task.finish();
    let recommendations = store.snapshot();

    let mut out: Box<dyn Write> = match &cmd.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };

    match format {
        OutputFormat::Json => {
            let output = RecommendOutput {
                report: &report,
                recommendations,
            };
            serde_json::to_writer_pretty(&mut out, &output)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(&mut out);
            writer.write_record(["profile", "listing", "score"])?;
            for entry in &recommendations {
                for scored in &entry.listings {
                    writer.write_record([
                        entry.profile.to_string(),
                        scored.listing.to_string(),
                        scored.score.to_string(),
                    ])?;
                }
            }
            writer.flush()?;
        }
        OutputFormat::Text => {
            for summary in &report.strategies {
                ui.section(
                    &format!("Strategy {}", summary.strategy),
                    [
                        ("profiles", summary.profiles.to_string()),
                        ("with results", summary.profiles_with_results.to_string()),
                        ("entries", summary.entries_written.to_string()),
                        ("failed", summary.failed_profiles.to_string()),
                    ],
                );
            }
            for entry in &recommendations {
                writeln!(
                    out,
                    "{}: {}",
                    entry.profile,
                    entry
                        .listings
                        .iter()
                        .map(|s| format!("{} ({})", s.listing, s.score))
                        .collect::<Vec<_>>()
                        .join(", ")
                )?;
            }
            ui.success(&format!(
                "{} profile(s) in {}",
                recommendations.len(),
                format_duration(elapsed)
            ));
        }
    }
    out.flush()?;
    Ok(())
}

fn apply_step<'g>(query: Query<'g>, token: &str) -> Result<Query<'g>, GraphError> {
    let (name, arg) = match token.split_once(':') {
        Some((name, arg)) => (name.trim(), Some(arg.trim())),
        None => (token.trim(), None),
    };
    let labels = || arg.map(|a| split_list(a, '|')).unwrap_or_default();
    let query = match name {
        "out" => query.out(labels()),
        "in" => query.in_(labels()),
        "both" => query.both(labels()),
        "out_e" => query.out_e(labels()),
        "in_e" => query.in_e(labels()),
        "both_e" => query.both_e(labels()),
        "in_v" => query.in_v(),
        "out_v" => query.out_v(),
        "id" => query.id(),
        "properties" | "to_dict" => query.properties(false),
        "internal_properties" => query.properties(true),
        "distinct" => query.distinct(),
        "limit" => {
            let n = arg
                .and_then(|a| a.parse::<usize>().ok())
                .ok_or_else(|| GraphError::InvalidArgument(format!("'{token}' needs limit:N")))?;
            query.limit(n)
        }
        "exclude" => query.exclude_ids(labels().iter().map(|raw| parse_id(raw))),
        "has" => {
            let (key, value) = arg.and_then(|a| a.split_once('=')).ok_or_else(|| {
                GraphError::InvalidArgument(format!("'{token}' needs has:key=value"))
            })?;
            query.has(key.trim(), parse_value(value.trim()))
        }
        "has_label" => query.has_label(labels()),
        other => {
            return Err(GraphError::InvalidArgument(format!(
                "unknown step '{other}'"
            )))
        }
    };
    Ok(query)
}

/// All-digit tokens address engine-assigned integer ids.
fn parse_id(raw: &str) -> ElementId {
    match raw.parse::<u64>() {
        Ok(id) if raw.bytes().all(|b| b.is_ascii_digit()) => ElementId::Int(id),
        _ => ElementId::Name(raw.to_owned()),
    }
}

fn parse_value(raw: &str) -> PropertyValue {
    if let Ok(i) = raw.parse::<i64>() {
        PropertyValue::Integer(i)
    } else if let Ok(b) = raw.parse::<bool>() {
        PropertyValue::Bool(b)
    } else {
        PropertyValue::String(raw.to_owned())
    }
}

fn render(graph: &Graph, element: &Element) -> Result<Value, serde_json::Error> {
    match element {
        Element::Properties(map) => serde_json::to_value(map),
        other => serde_json::to_value(graph.id_of(other)),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn split_list(input: &str, delim: char) -> Vec<String> {
    input
        .split(delim)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}
