//! Ledger inspection commands.

use clap::Subcommand;

use greentrigger_core::{Config, EventStore, SqliteEventStore, TriggerResponse};

use super::CommandResult;

#[derive(Subcommand)]
pub enum EventsAction {
    /// List events recorded for a trigger identity
    List {
        /// Trigger identity
        identity: String,
        /// Maximum number of events (0 = default cap)
        #[arg(long, default_value_t = 0)]
        limit: u32,
        /// Print the same payload a polling request would receive
        #[arg(long)]
        json: bool,
    },
    /// Count events recorded for a trigger identity
    Count {
        /// Trigger identity
        identity: String,
    },
}

pub fn run(action: EventsAction) -> CommandResult {
    let config = Config::load()?;
    let store = SqliteEventStore::open(&config.db_path()?, config.pool_options())?;

    match action {
        EventsAction::List {
            identity,
            limit,
            json,
        } => {
            let events = store.find_by_identity(&identity, limit)?;
            if json {
                let response = TriggerResponse {
                    data: events.iter().map(Into::into).collect(),
                };
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else if events.is_empty() {
                println!("No events for '{identity}'");
            } else {
                for event in &events {
                    println!(
                        "{}  {}  {:>6.2}%  {}",
                        event.id,
                        event.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
                        event.measurement,
                        if event.classification { "green" } else { "not green" }
                    );
                }
            }
        }
        EventsAction::Count { identity } => {
            println!("{}", store.count_by_identity(&identity)?);
        }
    }
    Ok(0)
}
