use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use mithqal::cli::convert::ConvertRequest;
use mithqal::core::log::init_logging;
use mithqal::core::{Currency, EditDirection, MetalType};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct Amount {
    /// Weight in mithqals to price
    #[arg(short, long)]
    mithqals: Option<String>,

    /// Amount of money to turn into mithqals
    #[arg(short = 'y', long)]
    money: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert between mithqals and money
    Convert {
        #[command(flatten)]
        amount: Amount,

        /// gold or silver
        #[arg(long)]
        metal: Option<MetalType>,

        /// ISO currency code, or CUSTOM to use --custom-rate
        #[arg(long)]
        currency: Option<Currency>,

        /// Units of the custom currency per USD
        #[arg(long)]
        custom_rate: Option<String>,
    },
    /// Show current gold and silver prices
    Prices {
        /// ISO currency code, or CUSTOM to use --custom-rate
        #[arg(long)]
        currency: Option<Currency>,

        /// Units of the custom currency per USD
        #[arg(long)]
        custom_rate: Option<String>,
    },
    /// Edit both fields from a prompt
    Interactive,
}

impl From<Commands> for mithqal::AppCommand {
    fn from(cmd: Commands) -> mithqal::AppCommand {
        match cmd {
            Commands::Convert {
                amount,
                metal,
                currency,
                custom_rate,
            } => {
                let (amount, direction) = match (amount.mithqals, amount.money) {
                    (Some(m), _) => (m, EditDirection::Mithqals),
                    (None, Some(money)) => (money, EditDirection::Money),
                    (None, None) => unreachable!("clap requires one amount"),
                };
                mithqal::AppCommand::Convert(ConvertRequest {
                    amount,
                    direction,
                    metal,
                    currency,
                    custom_rate,
                })
            }
            Commands::Prices {
                currency,
                custom_rate,
            } => mithqal::AppCommand::Prices {
                currency,
                custom_rate,
            },
            Commands::Interactive => mithqal::AppCommand::Interactive,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => mithqal::cli::setup::setup(),
        Some(cmd) => mithqal::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
