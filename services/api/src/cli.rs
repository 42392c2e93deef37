use crate::report::{run_analysis_report, run_benchmark_listing, run_table_check, AnalyzeArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use energy_ai::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Energy Efficiency Analyst",
    about = "Classify building energy use against benchmarks and explain the result",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Analyze one building and print the report
    Analyze(AnalyzeArgs),
    /// Print the benchmark table in use
    Benchmarks,
    /// Load and validate every configured static table
    Check,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Analyze(args) => run_analysis_report(args).await,
        Command::Benchmarks => run_benchmark_listing(),
        Command::Check => run_table_check(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["energy-ai-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn serve_accepts_host_and_port_overrides() {
        let cli = Cli::try_parse_from(["energy-ai-api", "serve", "--host", "0.0.0.0", "--port", "9100"])
            .expect("parses");
        match cli.command {
            Some(Command::Serve(args)) => {
                assert_eq!(args.host.as_deref(), Some("0.0.0.0"));
                assert_eq!(args.port, Some(9100));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn analyze_requires_area_and_energy() {
        let missing = Cli::try_parse_from(["energy-ai-api", "analyze", "--building-type", "office"]);
        assert!(missing.is_err());

        let cli = Cli::try_parse_from([
            "energy-ai-api",
            "analyze",
            "--building-type",
            "hospital",
            "--area",
            "10200",
            "--energy",
            "720893",
            "--period-months",
            "6",
        ])
        .expect("parses");
        match cli.command {
            Some(Command::Analyze(args)) => {
                assert_eq!(args.building_type, "hospital");
                assert_eq!(args.period_months, 6.0);
                assert!(!args.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
