//! Command line front end.
//!
//! ```bash
//! cropmet run demos/paddock.toml --output daily.csv
//! cropmet tav-amp demos/paddock.met
//! cropmet temp-sum demos/paddock.met --start 2020-01-01 --end 2020-03-31 --base 8
//! cropmet harvest-date demos/paddock.met --start 2020-01-01 --target 1200
//! ```

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use cropmet::core::errors::MetResult;
use cropmet::core::temp_sum::GetTempSum;
use cropmet::core::weather::{Weather, WeatherProvider};
use cropmet::{write_report, SimulationConfig};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Daily weather for crop simulations
#[derive(Parser, Debug)]
#[command(name = "cropmet")]
#[command(about = "Run weather simulations and query met files")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the simulation described by a TOML file and write the daily report
    Run {
        config: PathBuf,
        /// Report path, overriding the configuration. Stdout when neither is given.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the annual average temperature and amplitude of a met file
    TavAmp { file: PathBuf },
    /// Sum daily thermal time between two dates
    TempSum {
        file: PathBuf,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        /// Base temperature (oC)
        #[arg(long, default_value_t = 0.0)]
        base: f64,
    },
    /// Find the first day a thermal time target is reached
    HarvestDate {
        file: PathBuf,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        target: f64,
        /// Base temperature (oC)
        #[arg(long, default_value_t = 0.0)]
        base: f64,
    },
}

fn run(config: PathBuf, output: Option<PathBuf>) -> MetResult<()> {
    let config = SimulationConfig::from_file(&config)?;
    let output = match output {
        Some(path) => Some(std::env::current_dir()?.join(path)),
        None => config.output_path(),
    };
    // Model file names are relative to the configuration.
    if let Some(base) = &config.base_dir {
        std::env::set_current_dir(base)?;
    }

    let mut simulation = config.into_simulation()?;
    let reports = simulation.run()?;
    info!(
        days = reports.len(),
        warnings = simulation.summary().warnings().count(),
        "Simulation complete"
    );

    match output {
        Some(path) => {
            write_report(File::create(&path)?, &reports)?;
            info!(file = %path.display(), "Wrote report");
        }
        None => write_report(io::stdout().lock(), &reports)?,
    }
    Ok(())
}

fn execute(command: Command) -> MetResult<()> {
    match command {
        Command::Run { config, output } => run(config, output),
        Command::TavAmp { file } => {
            let mut weather = Weather::new(file);
            println!("tav = {:.2} (oC)", weather.tav()?);
            println!("amp = {:.2} (oC)", weather.amp()?);
            Ok(())
        }
        Command::TempSum {
            file,
            start,
            end,
            base,
        } => {
            let mut temp_sum = GetTempSum::new(file).with_base_temperature(base);
            println!("{:.1}", temp_sum.sum_thermal_time(start, end)?);
            Ok(())
        }
        Command::HarvestDate {
            file,
            start,
            target,
            base,
        } => {
            let mut temp_sum = GetTempSum::new(file).with_base_temperature(base);
            match temp_sum.harvest_date(start, target)? {
                Some(date) => println!("{date}"),
                None => println!("Target not reached before the end of the file"),
            }
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();
    match execute(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
