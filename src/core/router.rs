//! Maps form events onto session triggers.

use crate::core::generation::Generation;
use crate::core::quote::{Currency, MetalType};
use crate::core::session::{ConversionSession, EditDirection, RecalcOutcome};
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    MithqalsEdited(String),
    MoneyEdited(String),
    MetalSelected(MetalType),
    CurrencySelected(Currency),
    CustomRateEdited(String),
}

#[derive(Clone)]
pub struct InputRouter {
    session: ConversionSession,
}

impl InputRouter {
    pub fn new(session: ConversionSession) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &ConversionSession {
        &self.session
    }

    /// Applies `event` to the form. Returns the generation of the
    /// recalculation it calls for, started under the same lock as the edit.
    pub fn apply(&self, event: InputEvent) -> Option<Generation> {
        match event {
            InputEvent::MithqalsEdited(text) => {
                Some(self.session.edit_field(EditDirection::Mithqals, &text))
            }
            InputEvent::MoneyEdited(text) => {
                Some(self.session.edit_field(EditDirection::Money, &text))
            }
            InputEvent::MetalSelected(metal) => Some(self.session.select_metal(metal)),
            InputEvent::CurrencySelected(currency) => {
                Some(self.session.select_currency(currency))
            }
            InputEvent::CustomRateEdited(text) => self.session.edit_custom_rate(&text),
        }
    }

    /// Applies `event` and starts a background recalculation when needed.
    /// The task is never cancelled; a superseded one simply writes nothing.
    pub fn dispatch(&self, event: InputEvent) -> Option<JoinHandle<RecalcOutcome>> {
        debug!(?event, "Dispatching input event");
        let generation = self.apply(event)?;
        let session = self.session.clone();
        Some(tokio::spawn(async move { session.recalculate(generation).await }))
    }
}
