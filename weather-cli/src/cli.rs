use std::fmt;

use anyhow::{Context, bail};
use chrono::{FixedOffset, Local, Offset};
use clap::{Parser, Subcommand};
use inquire::{InquireError, Password, PasswordDisplayMode, Select, Text};
use tracing::debug;
use weather_core::{
    Config, Controller, DayOffset, ForecastStatus, Phase, WeatherProvider, provider_from_config,
};

use crate::view::{day_label, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather lookup CLI")]
pub struct Cli {
    /// Verbosity level (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Defaults to `interactive` when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key.
    Configure,

    /// Show weather for a city.
    Show {
        /// City name.
        city: String,

        /// Forecast day relative to today, 0 (today) .. 5.
        #[arg(long, value_parser = parse_day)]
        day: Option<DayOffset>,
    },

    /// Search cities and browse forecast days interactively.
    Interactive,
}

fn parse_day(s: &str) -> Result<DayOffset, String> {
    let n: u8 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    DayOffset::try_from(n).map_err(|e| e.to_string())
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.into_command() {
            Command::Configure => configure(),
            Command::Show { city, day } => show(city, day).await,
            Command::Interactive => interactive().await,
        }
    }

    fn into_command(self) -> Command {
        let command = self.command.unwrap_or(Command::Interactive);
        debug!(?command, "dispatching");
        command
    }
}

fn local_offset() -> FixedOffset {
    Local::now().offset().fix()
}

fn controller() -> anyhow::Result<Controller<Box<dyn WeatherProvider>>> {
    let config = Config::load()?;
    Ok(Controller::new(provider_from_config(&config)?))
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load_file()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }

    config.set_api_key(api_key.trim().to_string());
    config.save()?;

    println!("Saved API key to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(city: String, day: Option<DayOffset>) -> anyhow::Result<()> {
    let mut controller = controller()?;
    controller.set_query(city);
    controller.search().await;

    if let Some(error) = controller.state().error() {
        bail!("{error}");
    }

    let mut note = None;
    if let Some(day) = day {
        if !controller.select_day_local(day) {
            debug!(%day, "no forecast shown for requested day");
            note = Some(match controller.state().forecast() {
                ForecastStatus::Ready(_) => format!("No forecast available for day {day}."),
                _ => "Forecast unavailable.".to_string(),
            });
        }
    }

    print!("{}", render(controller.state(), local_offset()));
    if let Some(note) = note {
        println!("{note}");
    }

    Ok(())
}

#[derive(Debug, Clone)]
enum DayChoice {
    Day(DayOffset, String),
    NewSearch,
    Quit,
}

impl fmt::Display for DayChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayChoice::Day(_, label) => f.write_str(label),
            DayChoice::NewSearch => f.write_str("New search"),
            DayChoice::Quit => f.write_str("Quit"),
        }
    }
}

fn day_choices() -> Vec<DayChoice> {
    let today = Local::now().date_naive();
    DayOffset::all()
        .map(|d| DayChoice::Day(d, day_label(d, today)))
        .chain([DayChoice::NewSearch, DayChoice::Quit])
        .collect()
}

/// Treat Esc and Ctrl-C as "leave".
fn skippable<T>(result: Result<Option<T>, InquireError>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(value) => Ok(value),
        Err(InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn interactive() -> anyhow::Result<()> {
    let mut controller = controller()?;

    loop {
        let query = Text::new("City:")
            .with_placeholder("Enter City Name...")
            .prompt_skippable();
        let Some(query) = skippable(query)? else {
            return Ok(());
        };

        // A blank query resets first, then the search reports the missing city.
        controller.set_query(query);
        controller.search().await;
        print!("{}", render(controller.state(), local_offset()));

        if controller.state().phase() == Phase::Error {
            continue;
        }

        loop {
            let choice = Select::new("Forecast day:", day_choices()).prompt_skippable();
            match skippable(choice)? {
                Some(DayChoice::Day(day, label)) => {
                    if controller.select_day_local(day) {
                        print!("{}", render(controller.state(), local_offset()));
                    } else {
                        debug!(%day, "no forecast entry for selected day");
                        println!("No forecast available for {label}.");
                    }
                }
                Some(DayChoice::NewSearch) => break,
                Some(DayChoice::Quit) | None => return Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        io::Write,
        sync::{Arc, Mutex},
    };

    #[test]
    fn parse_day_accepts_zero_to_five() {
        assert_eq!(parse_day("0").unwrap().days(), 0);
        assert_eq!(parse_day("5").unwrap().days(), 5);
    }

    #[test]
    fn parse_day_rejects_out_of_range_and_garbage() {
        assert!(parse_day("6").unwrap_err().contains("out of range"));
        assert!(parse_day("tomorrow").unwrap_err().contains("not a number"));
    }

    #[test]
    fn cli_parses_show_with_day() {
        let cli = Cli::try_parse_from(["weather", "-v", "show", "London", "--day", "2"]).unwrap();

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Some(Command::Show { city, day }) => {
                assert_eq!(city, "London");
                assert_eq!(day.map(DayOffset::days), Some(2));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_rejects_day_out_of_range() {
        assert!(Cli::try_parse_from(["weather", "show", "London", "--day", "9"]).is_err());
    }

    #[test]
    fn cli_defaults_to_interactive() {
        let cli = Cli::try_parse_from(["weather"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn dispatch_is_logged_at_debug() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let cli = Cli::try_parse_from(["weather", "show", "London"]).unwrap();
        let command = tracing::subscriber::with_default(subscriber, || cli.into_command());

        assert!(matches!(command, Command::Show { .. }));
        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("dispatching"));
        assert!(output.contains("London"));
    }

    #[test]
    fn missing_subcommand_dispatches_interactive() {
        let cli = Cli::try_parse_from(["weather"]).unwrap();
        assert!(matches!(cli.into_command(), Command::Interactive));
    }

    #[test]
    fn day_choices_cover_six_days_then_actions() {
        let choices = day_choices();

        assert_eq!(choices.len(), 8);
        assert!(matches!(choices[0], DayChoice::Day(d, _) if d.days() == 0));
        assert!(matches!(choices[5], DayChoice::Day(d, _) if d.days() == 5));
        assert_eq!(choices[6].to_string(), "New search");
        assert_eq!(choices[7].to_string(), "Quit");
    }
}
