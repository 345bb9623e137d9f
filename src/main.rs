mod ui;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum, arg};
use egui::Vec2;
use itertools::Itertools;
use log::{error, info, warn};

use paddock::{
    ChartData, Dashboard, FileSessionProvider, PaddockError, PanelRequest, SessionType,
    aggregation::{format_delta, format_lap_time},
};
use ui::{config::AppConfig, dashboard::DashboardApp};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the interactive dashboard
    Dashboard {
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },
    /// Print one panel's aggregated table to stdout
    Report {
        #[arg(short, long)]
        data_dir: PathBuf,

        #[arg(short, long)]
        year: u16,

        #[arg(short, long)]
        race: String,

        #[arg(value_enum)]
        panel: ReportPanel,

        #[arg(long)]
        driver1: Option<String>,

        #[arg(long)]
        driver2: Option<String>,
    },
    /// Copy the qualifying and race exports of an event into another data directory
    Export {
        #[arg(short, long)]
        data_dir: PathBuf,

        #[arg(short, long)]
        year: u16,

        #[arg(short, long)]
        race: String,

        #[arg(short, long)]
        output_dir: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ReportPanel {
    QualifyingDelta,
    SectorTimes,
    HeadToHead,
    RaceDistribution,
    Acceleration,
}

fn dashboard(data_dir: Option<PathBuf>) {
    let mut app_config = AppConfig::from_local_file().unwrap_or_default();
    let data_dir = data_dir
        .or_else(|| app_config.data_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    app_config.data_dir = Some(data_dir.clone());
    info!("Starting dashboard on {:?}", data_dir);

    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = native_options
        .viewport
        .with_inner_size(Vec2::new(1280., 860.))
        .with_min_inner_size(Vec2::new(800., 600.));

    eframe::run_native(
        "Paddock",
        native_options,
        Box::new(|cc| Ok(Box::new(DashboardApp::new(data_dir, app_config, cc)))),
    )
    .expect("could not start app");
}

fn report(
    data_dir: PathBuf,
    year: u16,
    race: &str,
    panel: ReportPanel,
    driver1: Option<String>,
    driver2: Option<String>,
) -> Result<(), PaddockError> {
    let request = match panel {
        ReportPanel::QualifyingDelta => PanelRequest::QualifyingDelta,
        ReportPanel::SectorTimes => PanelRequest::SectorTimes,
        ReportPanel::HeadToHead => PanelRequest::HeadToHead {
            driver1: driver1.unwrap_or_default(),
            driver2: driver2.unwrap_or_default(),
        },
        ReportPanel::RaceDistribution => PanelRequest::RaceDistribution,
        ReportPanel::Acceleration => PanelRequest::Acceleration,
    };

    let mut dashboard = Dashboard::new(FileSessionProvider::new(data_dir));
    dashboard.confirm_selection(year, race)?;
    let chart = dashboard.generate(&request)?;
    print_chart(chart);
    Ok(())
}

fn export(data_dir: PathBuf, year: u16, race: &str, output_dir: &Path) -> Result<(), PaddockError> {
    let mut dashboard = Dashboard::new(FileSessionProvider::new(data_dir));
    dashboard.confirm_selection(year, race)?;
    let mut missing = None;
    let mut exported = 0;
    for session_type in [SessionType::Qualifying, SessionType::Race] {
        match dashboard.export_session(session_type, output_dir) {
            Ok(file) => {
                println!("{}", file.display());
                exported += 1;
            }
            Err(e @ PaddockError::SessionNotFound { .. }) => {
                warn!("Skipping: {}", e);
                missing = Some(e);
            }
            Err(e) => return Err(e),
        }
    }
    match missing {
        Some(e) if exported == 0 => Err(e),
        _ => Ok(()),
    }
}

fn print_chart(chart: &ChartData) {
    println!("{}", chart.title());
    println!();
    match chart {
        ChartData::QualifyingDelta(chart) => {
            for (i, entry) in chart.entries.iter().enumerate() {
                println!(
                    "{:>2}  {:<4} {:<28} {:>9}  +{}",
                    i + 1,
                    entry.driver,
                    entry.team,
                    format_lap_time(entry.lap_time),
                    format_delta(entry.delta)
                );
            }
        }
        ChartData::SectorTimes(chart) => {
            for (i, sector) in chart.sectors.iter().enumerate() {
                println!("Sector {}", i + 1);
                for entry in sector {
                    println!(
                        "  {:<4} {:<28} {:>8.3}  +{}",
                        entry.driver,
                        entry.team,
                        entry.time.as_secs_f64(),
                        format_delta(entry.delta)
                    );
                }
            }
        }
        ChartData::HeadToHead(chart) => {
            for trace in &chart.traces {
                let top_speed = trace.speed.iter().map(|[_, speed]| *speed).fold(0., f64::max);
                let full_throttle = trace
                    .throttle
                    .iter()
                    .filter(|[_, throttle]| *throttle >= 99.)
                    .count();
                println!(
                    "{:<4} {:<28} lap {:>2}  {:>9}  top speed {:>5.1} km/h  {:>4.1}% full throttle",
                    trace.driver,
                    trace.team,
                    trace.lap_number,
                    format_lap_time(trace.lap_time),
                    top_speed,
                    100. * full_throttle as f64 / trace.throttle.len().max(1) as f64
                );
            }
        }
        ChartData::RaceDistribution(chart) => {
            for driver in &chart.drivers {
                let median = driver
                    .median_seconds()
                    .map(|m| format!("{:.3}", m))
                    .unwrap_or_else(|| "-".to_string());
                let compounds = driver
                    .laps
                    .iter()
                    .filter_map(|l| l.compound)
                    .unique()
                    .join(", ");
                println!(
                    "{:>2}  {:<4} {:<28} {:>3} laps  median {:>8}  {}",
                    driver.position.map(|p| p.to_string()).unwrap_or_default(),
                    driver.driver,
                    driver.team,
                    driver.laps.len(),
                    median,
                    compounds
                );
            }
        }
        ChartData::Acceleration(chart) => {
            for interval in &chart.intervals {
                println!(
                    "{:<4} {:<28} 0-100 {:>5.2}s  100-200 {:>5.2}s  total {:>5.2}s",
                    interval.driver,
                    interval.team,
                    interval.zero_to_100().as_secs_f64(),
                    interval.hundred_to_200().as_secs_f64(),
                    interval.total().as_secs_f64()
                );
            }
        }
    }
}

fn main() {
    #[cfg(debug_assertions)]
    colog::init();

    let cli = Args::parse();
    ctrlc::set_handler(move || {
        println!("Exiting...");
        std::process::exit(0);
    })
    .expect("Could not set Ctrl-C handler");
    match cli.command {
        Commands::Dashboard { data_dir } => dashboard(data_dir),
        Commands::Report {
            data_dir,
            year,
            race,
            panel,
            driver1,
            driver2,
        } => {
            if let Err(e) = report(data_dir, year, &race, panel, driver1, driver2) {
                error!("Report failed: {:?}", e);
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
        Commands::Export {
            data_dir,
            year,
            race,
            output_dir,
        } => {
            if let Err(e) = export(data_dir, year, &race, &output_dir) {
                error!("Export failed: {:?}", e);
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
    };
}
