use super::ui;
use crate::core::config::AppConfig;
use crate::core::{
    ConversionSession, Currency, EditDirection, Form, InputEvent, InputRouter, MetalType,
    QuoteSource, RecalcOutcome,
};
use anyhow::{Result, anyhow};
use std::sync::Arc;
use tracing::debug;

/// A single conversion request from the command line.
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    pub amount: String,
    pub direction: EditDirection,
    pub metal: Option<MetalType>,
    pub currency: Option<Currency>,
    pub custom_rate: Option<String>,
}

/// Runs one conversion through a fresh session and returns the final form.
pub async fn convert(
    source: Arc<dyn QuoteSource>,
    config: &AppConfig,
    request: ConvertRequest,
) -> Result<(Form, RecalcOutcome)> {
    let mut form = Form::new(
        request.metal.unwrap_or(config.metal),
        request.currency.unwrap_or_else(|| config.currency.clone()),
    );
    form.custom_rate = request.custom_rate.unwrap_or_default();

    let router = InputRouter::new(ConversionSession::new(source, form));
    let event = match request.direction {
        EditDirection::Mithqals => InputEvent::MithqalsEdited(request.amount),
        EditDirection::Money => InputEvent::MoneyEdited(request.amount),
    };

    let handle = router
        .dispatch(event)
        .ok_or_else(|| anyhow!("Edit did not start a conversion"))?;
    let outcome = handle.await?;
    debug!(?outcome, "Conversion finished");

    Ok((router.session().snapshot(), outcome))
}

pub fn display_conversion(form: &Form, outcome: RecalcOutcome) -> String {
    let mut out = ui::render_form(form);
    match outcome {
        RecalcOutcome::Written(_) => {}
        RecalcOutcome::Cleared => {
            out.push('\n');
            out.push_str(&ui::style_text(
                "Amount must be a positive number",
                ui::StyleType::Error,
            ));
        }
        RecalcOutcome::Aborted | RecalcOutcome::Superseded => {
            out.push('\n');
            out.push_str(&ui::style_text(
                "Prices are unavailable right now",
                ui::StyleType::Error,
            ));
        }
    }
    out
}

pub async fn run(source: Arc<dyn QuoteSource>, config: &AppConfig, request: ConvertRequest) -> Result<()> {
    let (form, outcome) = convert(source, config, request).await?;
    println!("{}", display_conversion(&form, outcome));
    Ok(())
}
