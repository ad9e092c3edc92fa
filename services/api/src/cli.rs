use crate::demo::{run_demo, DemoArgs};
use crate::infra::parse_param;
use crate::server;
use clap::{Args, Parser, Subcommand};
use customs_workflow::config::AppConfig;
use customs_workflow::error::AppError;
use customs_workflow::telemetry;
use customs_workflow::workflows::ceisa::{CeisaProxy, CeisaRequest};

#[derive(Parser, Debug)]
#[command(
    name = "Customs Declaration Workflow",
    about = "Run the PEB/PIB declaration workflow service and its tooling",
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
    /// Walk a declaration through its lifecycle in memory and print the trail
    Demo(DemoArgs),
    /// Query the CEISA proxy (mock data when credentials are not configured)
    Ceisa {
        #[command(subcommand)]
        command: CeisaCommand,
    },
}

#[derive(Subcommand, Debug)]
enum CeisaCommand {
    /// Fetch records from a CEISA endpoint
    Fetch(CeisaFetchArgs),
    /// Report whether CEISA is up, down, or mocked
    Health,
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

#[derive(Args, Debug)]
pub(crate) struct CeisaFetchArgs {
    /// Endpoint path relative to the CEISA base URL, e.g. exports/peb
    #[arg(long)]
    pub(crate) endpoint: String,
    /// Query parameter as KEY=VALUE; repeatable
    #[arg(long = "param", value_parser = parse_param)]
    pub(crate) params: Vec<(String, String)>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args),
        Command::Ceisa { command } => run_ceisa(command).await,
    }
}

async fn run_ceisa(command: CeisaCommand) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let proxy = CeisaProxy::from_config(&config.ceisa)?;

    let request = match command {
        CeisaCommand::Fetch(args) => args
            .params
            .into_iter()
            .fold(CeisaRequest::fetch(args.endpoint), |request, (key, value)| {
                request.with_param(key, value)
            }),
        CeisaCommand::Health => CeisaRequest::health_check(),
    };

    let response = proxy.handle(request).await?;
    match serde_json::to_string_pretty(&response) {
        Ok(json) => println!("{json}"),
        Err(err) => println!("CEISA response unavailable: {err}"),
    }
    Ok(())
}
