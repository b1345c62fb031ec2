use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use drainer_core::app::{AnyOf, Deadline, Never, StopAfter};
use drainer_core::impls::{InMemoryQueueClient, RecordingInvocationTarget};
use drainer_core::ports::{ContinuationPredicate, InvocationTarget};
use drainer_core::{
    DrainEngine, EngineConfig, HandlerError, ItemHandler, ListHandler, Message, RunReport,
};

#[derive(Parser, Debug)]
#[command(name = "drainer", version, about = "Drain a message queue in batches")]
struct Cli {
    /// -v info, -vv debug, -vvv trace (RUST_LOG wins when set)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drain an in-memory queue seeded from a file and print the run report
    Run(RunArgs),
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Queue endpoint identifier (e.g. the queue URL)
    #[arg(long, env = "DRAINER_ENDPOINT")]
    endpoint: String,

    /// Messages per fetch (clamped to 1..=10)
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Payloads to seed: a JSON array, or one JSON value per line
    #[arg(short, long)]
    messages: PathBuf,

    /// Submit each message to this remote function instead of handling it locally
    #[arg(long)]
    item_target: Option<String>,

    /// Submit each batch's survivors to this remote function
    #[arg(long)]
    list_target: Option<String>,

    /// Local item handler fails messages whose payload has this field set to a truthy value
    #[arg(long)]
    fail_on: Option<String>,

    /// Stop after this many iterations
    #[arg(long)]
    max_iterations: Option<u64>,

    /// Stop fetching once this much time has passed
    #[arg(long)]
    max_duration_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Run(args) => cmd_run(args).await,
    }
}

async fn cmd_run(args: RunArgs) -> Result<()> {
    let payloads = load_payloads(&args.messages).await?;

    let queue = Arc::new(InMemoryQueueClient::new(args.endpoint.clone()));
    for payload in payloads {
        queue.push(payload).await;
    }
    let seeded = queue.ready_len().await;

    let target = Arc::new(RecordingInvocationTarget::new());
    let invoker: Arc<dyn InvocationTarget> = target.clone();

    let mut config = EngineConfig::new(args.endpoint);
    config.batch_size = args.batch_size;

    let engine = DrainEngine::builder(config)
        .queue(queue.clone())
        .invocation_target(invoker)
        .item_handler(item_handler(args.item_target, args.fail_on))
        .list_handler(list_handler(args.list_target))
        .build()
        .context("invalid engine configuration")?;

    let predicate = stop_predicate(args.max_iterations, args.max_duration_secs);
    info!(seeded, batch_size = engine.batch_size(), "starting drain");

    let report = engine
        .run_with_report(predicate.as_ref())
        .await
        .context("drain run aborted")?;

    print_report(
        &report,
        queue.ready_len().await,
        queue.in_flight_len().await,
        target.submissions().len(),
    )
}

async fn load_payloads(path: &Path) -> Result<Vec<Value>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    if raw.trim_start().starts_with('[') {
        return serde_json::from_str(&raw)
            .with_context(|| format!("{} is not a JSON array", path.display()));
    }

    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("{}:{}: invalid JSON", path.display(), i + 1))
        })
        .collect()
}

fn item_handler(target: Option<String>, fail_on: Option<String>) -> ItemHandler {
    if let Some(target) = target {
        return ItemHandler::remote(target);
    }

    ItemHandler::from_fn(move |message: Message| {
        let failed = fail_on
            .as_deref()
            .is_some_and(|field| is_truthy(message.payload().get(field)));
        async move {
            if failed {
                return Err(HandlerError::failed(format!(
                    "payload flagged for failure ({})",
                    message.ack_handle()
                )));
            }
            Ok(message.payload().clone())
        }
    })
}

fn list_handler(target: Option<String>) -> ListHandler {
    match target {
        Some(target) => ListHandler::remote(target),
        None => ListHandler::from_fn(|survivors: Vec<Message>| async move {
            info!(survivors = survivors.len(), "batch handled");
            Ok::<(), HandlerError>(())
        }),
    }
}

fn stop_predicate(
    max_iterations: Option<u64>,
    max_duration_secs: Option<u64>,
) -> Box<dyn ContinuationPredicate> {
    let mut any = AnyOf::new();
    if let Some(n) = max_iterations {
        any = any.with(StopAfter::new(n));
    }
    if let Some(secs) = max_duration_secs {
        any = any.with(Deadline::after(Duration::from_secs(secs)));
    }

    if any.is_empty() {
        Box::new(Never)
    } else {
        Box::new(any)
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

fn print_report(report: &RunReport, ready: usize, in_flight: usize, submissions: usize) -> Result<()> {
    let out = serde_json::json!({
        "report": report,
        "queue": { "ready": ready, "in_flight": in_flight },
        "remote_submissions": submissions,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);

    if !report.ack_failures.is_empty() {
        bail!("{} acknowledgment(s) failed", report.ack_failures.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use drainer_core::AckHandle;
    use drainer_core::app::ItemCallback;
    use serde_json::json;

    #[test]
    fn truthiness() {
        assert!(!is_truthy(None));
        assert!(!is_truthy(Some(&json!(null))));
        assert!(!is_truthy(Some(&json!(false))));
        assert!(!is_truthy(Some(&json!(0))));
        assert!(!is_truthy(Some(&json!(""))));
        assert!(is_truthy(Some(&json!(true))));
        assert!(is_truthy(Some(&json!(2))));
        assert!(is_truthy(Some(&json!("yes"))));
        assert!(is_truthy(Some(&json!({}))));
    }

    #[test]
    fn cli_parses_run() {
        let cli = Cli::try_parse_from([
            "drainer",
            "-vv",
            "run",
            "--endpoint",
            "https://sqs.local/q",
            "--messages",
            "m.jsonl",
            "--batch-size",
            "4",
            "--max-iterations",
            "3",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Command::Run(args) = cli.command;
        assert_eq!(args.batch_size, Some(4));
        assert_eq!(args.max_iterations, Some(3));
        assert!(args.item_target.is_none());
    }

    #[tokio::test]
    async fn loads_json_lines_and_arrays() {
        let dir = std::env::temp_dir().join(format!("drainer-cli-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();

        let lines = dir.join("m.jsonl");
        tokio::fs::write(&lines, "{\"a\":1}\n\n{\"a\":2}\n").await.unwrap();
        assert_eq!(load_payloads(&lines).await.unwrap(), vec![json!({"a":1}), json!({"a":2})]);

        let array = dir.join("m.json");
        tokio::fs::write(&array, "[1, 2, 3]").await.unwrap();
        assert_eq!(load_payloads(&array).await.unwrap().len(), 3);

        let bad = dir.join("bad.jsonl");
        tokio::fs::write(&bad, "{\"a\":1}\nnot json\n").await.unwrap();
        let err = load_payloads(&bad).await.unwrap_err();
        assert!(format!("{err:#}").contains(":2: invalid JSON"));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn local_handler_fails_flagged_payloads() {
        let ItemHandler::Local(cb) = item_handler(None, Some("poison".into())) else {
            panic!("expected a local handler");
        };
        let ok = Message::new(json!({"poison": false}), AckHandle::new("a"));
        let bad = Message::new(json!({"poison": true}), AckHandle::new("b"));
        assert!(cb.handle(ok).await.is_ok());
        assert!(cb.handle(bad).await.is_err());
    }

    #[tokio::test]
    async fn predicate_defaults_to_never() {
        let p = stop_predicate(None, None);
        assert!(!p.should_stop().await.unwrap());

        let p = stop_predicate(Some(0), None);
        assert!(p.should_stop().await.unwrap());
    }
}
