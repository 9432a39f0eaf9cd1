use clap::{Parser, Subcommand};
use tracing_subscriber::util::TryInitError;

mod db;
mod logging;
mod order;
mod product;
mod session;
mod tenant;

#[derive(Debug, Parser)]
#[command(name = "emporium-app", about = "Emporium storefront CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    logging: logging::LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Tenant(tenant::TenantCommand),
    Db(db::DbCommand),
    Product(product::ProductCommand),
    Order(order::OrderCommand),
}

impl Cli {
    pub(crate) fn init_logging(&self) -> Result<(), TryInitError> {
        logging::init_subscriber(&self.logging)
    }

    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Tenant(command) => tenant::run(command).await,
            Commands::Db(command) => db::run(command).await,
            Commands::Product(command) => product::run(command).await,
            Commands::Order(command) => order::run(command).await,
        }
    }
}
