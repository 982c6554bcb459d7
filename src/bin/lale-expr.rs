use std::{
    fs::File,
    io::{BufReader, Read as _},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "lale-expr", version)]
struct Cli {
    /// Log debug events to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse an expression and print its canonical text.
    Fmt(ExprArgs),
    /// Parse an expression and print its node tree as JSON.
    Tree(ExprArgs),
    /// Validate an aggregate configuration and print its hyperparameters.
    Aggregate(AggregateArgs),
}

#[derive(Parser, Debug)]
struct ExprArgs {
    /// Expression text, e.g. `mean(it.sales)`.
    expr: String,
}

#[derive(Parser, Debug)]
struct AggregateArgs {
    /// Aggregate configuration JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Print the visualization label instead of the hyperparameters.
    #[arg(long)]
    label: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Fmt(args) => cmd_fmt(args),
        Command::Tree(args) => cmd_tree(args),
        Command::Aggregate(args) => cmd_aggregate(args),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_fmt(args: ExprArgs) -> anyhow::Result<()> {
    let expr = lale_expr::Expr::parse(&args.expr)
        .with_context(|| format!("parse expression '{}'", args.expr))?;
    println!("{expr}");
    Ok(())
}

fn cmd_tree(args: ExprArgs) -> anyhow::Result<()> {
    let expr = lale_expr::Expr::parse(&args.expr)
        .with_context(|| format!("parse expression '{}'", args.expr))?;
    let json = serde_json::to_string_pretty(expr.node()).context("serialize node tree")?;
    println!("{json}");
    Ok(())
}

fn read_aggregate_json(path: &Path) -> anyhow::Result<lale_expr::Aggregate> {
    let f = File::open(path).with_context(|| format!("open aggregate '{}'", path.display()))?;
    let mut src = String::new();
    BufReader::new(f)
        .read_to_string(&mut src)
        .with_context(|| format!("read aggregate '{}'", path.display()))?;
    let agg = lale_expr::Aggregate::from_json(&src).context("parse aggregate JSON")?;
    Ok(agg)
}

fn cmd_aggregate(args: AggregateArgs) -> anyhow::Result<()> {
    let agg = read_aggregate_json(&args.in_path)?;
    tracing::debug!(path = %args.in_path.display(), columns = agg.columns.len(), "loaded aggregate");

    if args.label {
        println!("{}", agg.viz_label());
    } else {
        let json = serde_json::to_string_pretty(&agg.hyperparams()).context("serialize hyperparams")?;
        println!("{json}");
    }
    Ok(())
}
