pub mod cli;
pub mod core;
pub mod providers;

use crate::cli::convert::ConvertRequest;
use crate::core::config::AppConfig;
use crate::core::convert::parse_custom_rate;
use crate::core::{ConversionSession, Currency, Form, InputRouter, QuoteSource};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Convert(ConvertRequest),
    Prices {
        currency: Option<Currency>,
        custom_rate: Option<String>,
    },
    Interactive,
}

fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("mithqal starting...");

    let config = load_config(config_path)?;
    let source: Arc<dyn QuoteSource> = Arc::new(providers::rate_source(&config));

    match command {
        AppCommand::Convert(request) => cli::convert::run(source, &config, request).await,
        AppCommand::Prices {
            currency,
            custom_rate,
        } => {
            let currency = currency.unwrap_or_else(|| config.currency.clone());
            let custom_rate = parse_custom_rate(custom_rate.as_deref().unwrap_or_default());
            cli::prices::run(source.as_ref(), &currency, custom_rate).await
        }
        AppCommand::Interactive => {
            let form = Form::new(config.metal, config.currency.clone());
            let router = InputRouter::new(ConversionSession::new(source, form));
            cli::interactive::run(router).await
        }
    }
}
