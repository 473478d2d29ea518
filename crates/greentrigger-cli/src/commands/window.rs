//! Window check command.

use chrono::Utc;
use clap::Subcommand;

use greentrigger_core::window::parse_time_of_day;
use greentrigger_core::{Config, TimeWindow};

use super::CommandResult;

#[derive(Subcommand)]
pub enum WindowAction {
    /// Check whether a time falls inside a window
    Check {
        /// Window start (e.g. 09:00 or 9:00 PM)
        #[arg(long)]
        from: String,
        /// Window end
        #[arg(long)]
        to: String,
        /// Time to check; defaults to now in the configured timezone
        #[arg(long)]
        at: Option<String>,
    },
}

pub fn run(action: WindowAction) -> CommandResult {
    match action {
        WindowAction::Check { from, to, at } => {
            let window = TimeWindow::parse(&from, &to)?;
            let now = match at {
                Some(at) => parse_time_of_day(&at)?,
                None => {
                    let offset = Config::load()?.window_offset()?;
                    Utc::now().with_timezone(&offset).time()
                }
            };

            let verdict = if window.contains(now) { "inside" } else { "outside" };
            let kind = if window.wraps_midnight() { " (wraps midnight)" } else { "" };
            println!("{} is {verdict} {window}{kind}", now.format("%H:%M"));
        }
    }
    Ok(0)
}
