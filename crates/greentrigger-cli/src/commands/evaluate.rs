//! Answer one polling request from the command line.
//!
//! The response payload goes to stdout and the exit code carries the
//! outcome: 0 for success, 2 for a bad request, 1 for a server-side failure.

use std::io::Read;
use std::path::PathBuf;

use chrono::{DateTime, FixedOffset, Utc};
use clap::Args;
use tracing::debug;

use greentrigger_core::{
    Config, Evaluation, EventStore, HttpMeasurementSource, InMemoryEventStore,
    MeasurementSource, Reply, SkipReason, SqliteEventStore, StaticMeasurementSource,
    TriggerEngine, TriggerError, TriggerRequest, UnconfiguredMeasurementSource,
};

use super::CommandResult;

#[derive(Args)]
pub struct EvaluateArgs {
    /// Request body as JSON (read from stdin when neither --body nor --file is given)
    #[arg(long, conflicts_with = "file")]
    body: Option<String>,
    /// Read the request body from a file
    #[arg(long)]
    file: Option<PathBuf>,
    /// Evaluate as if it were this instant (RFC 3339)
    #[arg(long)]
    now: Option<String>,
    /// Use a throwaway in-memory ledger instead of the configured one
    #[arg(long)]
    dry_run: bool,
    /// Use this green-energy percentage instead of querying the provider
    #[arg(long)]
    measurement: Option<f64>,
}

pub fn run(args: EvaluateArgs) -> CommandResult {
    let body = read_body(&args)?;
    let now = match &args.now {
        Some(now) => DateTime::parse_from_rfc3339(now)?.with_timezone(&Utc),
        None => Utc::now(),
    };

    // Bad requests and zero-limit requests never open the ledger or the provider
    let request = match TriggerRequest::from_slice(&body) {
        Ok(request) => request,
        Err(e) => return Ok(respond(&Err(e))),
    };
    if request.wants_nothing() {
        return Ok(respond(&Ok(Evaluation::Skipped(SkipReason::ZeroLimit))));
    }

    let config = Config::load()?;
    let offset = config.window_offset()?;

    debug!(
        trigger_identity = %request.trigger_identity,
        dry_run = args.dry_run,
        %now,
        "evaluating request"
    );
    let result = build_engine(&args, &config, offset)
        .and_then(|engine| engine.evaluate_at(&request, now));
    Ok(respond(&result))
}

/// Print the payload and return the exit code for its signal.
fn respond(result: &Result<Evaluation, TriggerError>) -> i32 {
    let reply = Reply::from_result(result);
    println!("{}", reply.body);
    reply.signal.exit_code()
}

type CliEngine = TriggerEngine<Box<dyn EventStore>, Box<dyn MeasurementSource>>;

fn build_engine(
    args: &EvaluateArgs,
    config: &Config,
    offset: FixedOffset,
) -> Result<CliEngine, TriggerError> {
    let source: Box<dyn MeasurementSource> = match args.measurement {
        Some(value) => Box::new(StaticMeasurementSource(value)),
        None if config.has_measurement_url() => {
            Box::new(HttpMeasurementSource::from_config(&config.measurement)?)
        }
        None => Box::new(UnconfiguredMeasurementSource),
    };

    let store: Box<dyn EventStore> = if args.dry_run {
        Box::new(InMemoryEventStore::new())
    } else {
        let path = config
            .db_path()
            .map_err(|e| TriggerError::persistence(e.to_string()))?;
        Box::new(SqliteEventStore::open(&path, config.pool_options())?)
    };

    Ok(TriggerEngine::new(store, source).with_utc_offset(offset))
}

fn read_body(args: &EvaluateArgs) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    if let Some(body) = &args.body {
        return Ok(body.clone().into_bytes());
    }
    if let Some(path) = &args.file {
        return Ok(std::fs::read(path)?);
    }
    // Raw bytes: UTF-8 is checked when the request is decoded
    let mut body = Vec::new();
    std::io::stdin().read_to_end(&mut body)?;
    Ok(body)
}
