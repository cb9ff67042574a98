use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use benchstack::apply::Kubectl;
use benchstack::grafana::{Client, Dashboard};
use benchstack::group::GroupName;

#[derive(Debug, Parser)]
#[clap(version, about = "Deploy and monitor a Temporal benchmark stack")]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Provision resources, then transform and apply every manifest group.
    Deploy {
        #[clap(short, long, default_value = "benchstack.yaml")]
        config: PathBuf,
        /// Directory holding the temporal/, benchmark/, and monitoring/
        /// manifest groups.
        #[clap(short, long, default_value = "manifests")]
        manifests: PathBuf,
    },
    /// Run the same pipeline but write the finished groups to stdout.
    Render {
        #[clap(short, long, default_value = "benchstack.yaml")]
        config: PathBuf,
        #[clap(short, long, default_value = "manifests")]
        manifests: PathBuf,
        /// Restrict output to one group.
        #[clap(short, long)]
        group: Option<GroupName>,
    },
    /// Upload a dashboard definition to Grafana. Reads `GRAFANA_HOST` and
    /// `GRAFANA_API_TOKEN` from the environment.
    UploadDashboard {
        #[clap(default_value = "dashboards/stack.yaml")]
        file: PathBuf,
        /// Folder the dashboard is filed under.
        #[clap(long, default_value = "Benchmarks")]
        folder: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            print_error(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    match args.command {
        Command::Deploy { config, manifests } => {
            benchstack::deploy(&config, &manifests, &mut Kubectl).await
        }
        Command::Render { config, manifests, group } => {
            let mut stdout = std::io::stdout().lock();
            benchstack::render(&config, &manifests, group, &mut stdout).await
        }
        Command::UploadDashboard { file, folder } => {
            let host = std::env::var("GRAFANA_HOST").context("GRAFANA_HOST must be set")?;
            let token = std::env::var("GRAFANA_API_TOKEN").context("GRAFANA_API_TOKEN must be set")?;
            let dashboard = Dashboard::load(&file)?;
            let client = Client::new(&host, &token)?;
            let folder = client.find_or_create_folder(&folder).await?;
            client.upsert_dashboard(&folder, &dashboard).await
        }
    }
}

fn print_error(err: &anyhow::Error) {
    eprintln!("error: {err}");
    for cause in err.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }
}
