//! Two linked fields kept in sync through live quotes.
//!
//! A [`ConversionSession`] owns the form, the last-edited direction, and the
//! generation counter. Every trigger hands back the [`Generation`] it started,
//! which [`ConversionSession::recalculate`] then runs under; overlapping runs
//! are allowed and only the latest one may write.

use crate::core::convert::{
    MITHQAL_TO_GRAM, format_amount, mithqals_to_money, money_to_mithqals, parse_amount,
    parse_custom_rate,
};
use crate::core::generation::{Generation, LatestWins};
use crate::core::quote::{Currency, MetalType};
use crate::core::source::QuoteSource;
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

/// Field the user typed into last. Its value is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditDirection {
    #[default]
    Mithqals,
    Money,
}

impl EditDirection {
    pub fn counterpart(&self) -> EditDirection {
        match self {
            EditDirection::Mithqals => EditDirection::Money,
            EditDirection::Money => EditDirection::Mithqals,
        }
    }
}

impl Display for EditDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditDirection::Mithqals => write!(f, "mithqals"),
            EditDirection::Money => write!(f, "money"),
        }
    }
}

/// Text and selection state of the conversion form.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Form {
    pub mithqals: String,
    pub money: String,
    pub metal: MetalType,
    pub currency: Currency,
    pub custom_rate: String,
    pub direction: EditDirection,
}

impl Form {
    pub fn new(metal: MetalType, currency: Currency) -> Self {
        Self {
            metal,
            currency,
            ..Self::default()
        }
    }

    pub fn field(&self, field: EditDirection) -> &str {
        match field {
            EditDirection::Mithqals => &self.mithqals,
            EditDirection::Money => &self.money,
        }
    }

    fn field_mut(&mut self, field: EditDirection) -> &mut String {
        match field {
            EditDirection::Mithqals => &mut self.mithqals,
            EditDirection::Money => &mut self.money,
        }
    }

    /// The custom rate field is only shown for the custom currency.
    pub fn custom_rate_visible(&self) -> bool {
        self.currency.is_custom()
    }

    pub fn input(&self) -> ConversionInput {
        ConversionInput {
            direction: self.direction,
            amount_mithqals: self.mithqals.clone(),
            amount_money: self.money.clone(),
            metal: self.metal,
            currency: self.currency.clone(),
            custom_rate: parse_custom_rate(&self.custom_rate),
        }
    }
}

/// Snapshot of the form taken at the start of a recalculation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionInput {
    pub direction: EditDirection,
    pub amount_mithqals: String,
    pub amount_money: String,
    pub metal: MetalType,
    pub currency: Currency,
    pub custom_rate: f64,
}

impl ConversionInput {
    pub fn authoritative(&self) -> &str {
        match self.direction {
            EditDirection::Mithqals => &self.amount_mithqals,
            EditDirection::Money => &self.amount_money,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecalcOutcome {
    /// The counterpart field now holds this value.
    Written(f64),
    /// The counterpart field was emptied.
    Cleared,
    /// A newer recalculation started; nothing was written.
    Superseded,
    /// A quote was unavailable and the failure policy said to stop.
    Aborted,
}

#[derive(Clone)]
pub struct ConversionSession {
    source: Arc<dyn QuoteSource>,
    form: Arc<LatestWins<Form>>,
    mithqal_to_gram: f64,
}

impl ConversionSession {
    pub fn new(source: Arc<dyn QuoteSource>, form: Form) -> Self {
        Self {
            source,
            form: Arc::new(LatestWins::new(form)),
            mithqal_to_gram: MITHQAL_TO_GRAM,
        }
    }

    pub fn with_mithqal_to_gram(mut self, grams: f64) -> Self {
        self.mithqal_to_gram = grams;
        self
    }

    pub fn snapshot(&self) -> Form {
        self.form.read(Form::clone)
    }

    pub fn direction(&self) -> EditDirection {
        self.form.read(|form| form.direction)
    }

    /// Receives the form after every edit and every accepted result.
    pub fn subscribe(&self) -> watch::Receiver<Form> {
        self.form.subscribe()
    }

    /// Direct edit of an amount field. Makes that field authoritative.
    pub fn edit_field(&self, field: EditDirection, text: &str) -> Generation {
        self.form.supersede(|form| {
            form.direction = field;
            *form.field_mut(field) = text.to_string();
        })
    }

    pub fn select_metal(&self, metal: MetalType) -> Generation {
        self.form.supersede(|form| form.metal = metal)
    }

    pub fn select_currency(&self, currency: Currency) -> Generation {
        self.form.supersede(|form| form.currency = currency)
    }

    /// Starts a generation only when the new rate affects the result.
    pub fn edit_custom_rate(&self, text: &str) -> Option<Generation> {
        self.form.edit(|form| {
            form.custom_rate = text.to_string();
            form.currency.is_custom()
        })
    }

    #[instrument(
        name = "Recalculate",
        skip(self, generation),
        fields(generation = generation.value())
    )]
    pub async fn recalculate(&self, generation: Generation) -> RecalcOutcome {
        let input = self.form.read(Form::input);
        let target = input.direction.counterpart();

        let amount = match parse_amount(input.authoritative()) {
            Ok(amount) => amount,
            Err(e) => {
                debug!(error = %e, "Clearing {}", target);
                return if self.form.publish(generation, |form| form.field_mut(target).clear()) {
                    RecalcOutcome::Cleared
                } else {
                    RecalcOutcome::Superseded
                };
            }
        };

        let price = match self.source.metal_price_per_gram(input.metal).await {
            Ok(price) => price,
            Err(e) => {
                warn!(error = %e, metal = %input.metal, "Metal price unavailable");
                return RecalcOutcome::Aborted;
            }
        };
        if !self.form.is_current(generation) {
            debug!("Superseded after metal price fetch");
            return RecalcOutcome::Superseded;
        }

        let rate = if input.currency.is_usd() {
            1.0
        } else {
            match self
                .source
                .currency_rate(&input.currency, input.custom_rate)
                .await
            {
                Ok(rate) => rate,
                Err(e) => {
                    warn!(error = %e, currency = %input.currency, "Exchange rate unavailable");
                    return RecalcOutcome::Aborted;
                }
            }
        };
        if !self.form.is_current(generation) {
            debug!("Superseded after exchange rate fetch");
            return RecalcOutcome::Superseded;
        }

        let value = match input.direction {
            EditDirection::Mithqals => mithqals_to_money(amount, price, self.mithqal_to_gram, rate),
            EditDirection::Money => money_to_mithqals(amount, price, self.mithqal_to_gram, rate),
        };
        debug!(amount, price, rate, value, "Converted {} to {}", input.direction, target);

        let text = if value.is_finite() {
            format_amount(value)
        } else {
            String::new()
        };
        let written = self.form.publish(generation, |form| *form.field_mut(target) = text);

        match (written, value.is_finite()) {
            (false, _) => RecalcOutcome::Superseded,
            (true, true) => RecalcOutcome::Written(value),
            (true, false) => RecalcOutcome::Cleared,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Answers metal price requests in order, each after its own delay.
    struct ScriptedSource {
        prices: Mutex<VecDeque<(u64, Result<f64>)>>,
        metal_calls: AtomicUsize,
        rate_calls: AtomicUsize,
        rate: f64,
    }

    impl ScriptedSource {
        fn new(prices: Vec<(u64, Result<f64>)>) -> Self {
            Self {
                prices: Mutex::new(prices.into()),
                metal_calls: AtomicUsize::new(0),
                rate_calls: AtomicUsize::new(0),
                rate: 2.0,
            }
        }

        fn fixed(price: f64) -> Self {
            Self::new((0..8).map(|_| (0, Ok(price))).collect())
        }
    }

    #[async_trait]
    impl QuoteSource for ScriptedSource {
        async fn metal_price_per_gram(&self, _metal: MetalType) -> Result<f64> {
            self.metal_calls.fetch_add(1, Ordering::SeqCst);
            let (delay, price) = self
                .prices
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or((0, Err(anyhow!("script exhausted"))));
            tokio::time::sleep(Duration::from_millis(delay)).await;
            price
        }

        async fn currency_rate(&self, currency: &Currency, custom_rate: f64) -> Result<f64> {
            self.rate_calls.fetch_add(1, Ordering::SeqCst);
            Ok(if currency.is_custom() { custom_rate } else { self.rate })
        }
    }

    fn session(source: Arc<ScriptedSource>) -> ConversionSession {
        ConversionSession::new(source, Form::default()).with_mithqal_to_gram(1.0)
    }

    #[tokio::test]
    async fn test_mithqals_to_money_in_usd() {
        let source = Arc::new(ScriptedSource::fixed(80.0));
        let session = session(source.clone());

        let generation = session.edit_field(EditDirection::Mithqals, "1,000");
        assert_eq!(session.recalculate(generation).await, RecalcOutcome::Written(80_000.0));
        assert_eq!(session.snapshot().money, "80000.00");
        assert_eq!(source.rate_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_money_to_mithqals_with_rate() {
        let source = Arc::new(ScriptedSource::fixed(80.0));
        let session = session(source.clone());
        session.select_currency(Currency::Code("EUR".into()));

        let generation = session.edit_field(EditDirection::Money, "320");
        assert_eq!(session.recalculate(generation).await, RecalcOutcome::Written(2.0));
        assert_eq!(session.snapshot().mithqals, "2.00");
        assert_eq!(source.rate_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_input_clears_counterpart_without_fetch() {
        let source = Arc::new(ScriptedSource::fixed(80.0));
        let session = session(source.clone());
        let generation = session.edit_field(EditDirection::Mithqals, "1");
        session.recalculate(generation).await;
        assert_eq!(session.snapshot().money, "80.00");

        for text in ["0", "-5", "", "abc"] {
            let generation = session.edit_field(EditDirection::Mithqals, text);
            assert_eq!(session.recalculate(generation).await, RecalcOutcome::Cleared);
            assert_eq!(session.snapshot().money, "");
        }
        assert_eq!(source.metal_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_result_is_discarded_when_it_lands_last() {
        let source = Arc::new(ScriptedSource::new(vec![(100, Ok(10.0)), (10, Ok(20.0))]));
        let session = session(source);

        let generation = session.edit_field(EditDirection::Mithqals, "1");
        let mut first = Box::pin(session.recalculate(generation));
        assert!(futures::poll!(&mut first).is_pending());

        let generation = session.edit_field(EditDirection::Mithqals, "2");
        let second = session.recalculate(generation);

        let (first, second) = tokio::join!(first, second);
        assert_eq!(first, RecalcOutcome::Superseded);
        assert_eq!(second, RecalcOutcome::Written(40.0));
        assert_eq!(session.snapshot().money, "40.00");
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_result_is_discarded_when_it_lands_first() {
        let source = Arc::new(ScriptedSource::new(vec![(10, Ok(10.0)), (100, Ok(20.0))]));
        let session = session(source);

        let generation = session.edit_field(EditDirection::Mithqals, "1");
        let mut first = Box::pin(session.recalculate(generation));
        assert!(futures::poll!(&mut first).is_pending());

        let generation = session.select_metal(MetalType::Silver);
        let mut second = Box::pin(session.recalculate(generation));
        assert!(futures::poll!(&mut second).is_pending());

        assert_eq!(first.await, RecalcOutcome::Superseded);
        assert_eq!(session.snapshot().money, "");
        assert_eq!(second.await, RecalcOutcome::Written(20.0));
        assert_eq!(session.snapshot().money, "20.00");
    }

    #[tokio::test]
    async fn test_repeated_recalculation_is_idempotent() {
        let source = Arc::new(ScriptedSource::fixed(80.0));
        let session = session(source);
        let generation = session.edit_field(EditDirection::Money, "40");

        session.recalculate(generation).await;
        let once = session.snapshot();
        session.recalculate(session.form.begin()).await;
        assert_eq!(session.snapshot(), once);
        assert_eq!(once.mithqals, "0.50");
    }

    #[tokio::test]
    async fn test_indirect_triggers_keep_direction() {
        let source = Arc::new(ScriptedSource::fixed(80.0));
        let session = session(source);
        let generation = session.edit_field(EditDirection::Money, "160");
        session.recalculate(generation).await;
        assert_eq!(session.snapshot().mithqals, "2.00");

        session.select_currency(Currency::Custom);
        let generation = session.edit_custom_rate("4").unwrap();
        assert_eq!(session.direction(), EditDirection::Money);
        session.recalculate(generation).await;
        assert_eq!(session.snapshot().mithqals, "0.50");
        assert_eq!(session.snapshot().money, "160");
    }

    #[tokio::test]
    async fn test_custom_rate_edit_ignored_for_real_currency() {
        let session = session(Arc::new(ScriptedSource::fixed(80.0)));
        assert!(session.edit_custom_rate("3").is_none());
        assert!(!session.snapshot().custom_rate_visible());
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_fields_unchanged() {
        let source = Arc::new(ScriptedSource::new(vec![
            (0, Ok(80.0)),
            (0, Err(anyhow!("offline"))),
        ]));
        let session = session(source);
        let generation = session.edit_field(EditDirection::Mithqals, "1");
        session.recalculate(generation).await;

        let generation = session.edit_field(EditDirection::Mithqals, "3");
        assert_eq!(session.recalculate(generation).await, RecalcOutcome::Aborted);
        assert_eq!(session.snapshot().money, "80.00");
    }

    #[tokio::test]
    async fn test_zero_price_clears_mithqals() {
        let session = session(Arc::new(ScriptedSource::fixed(0.0)));
        session.edit_field(EditDirection::Mithqals, "9");
        let generation = session.edit_field(EditDirection::Money, "100");
        assert_eq!(session.recalculate(generation).await, RecalcOutcome::Cleared);
        assert_eq!(session.snapshot().mithqals, "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_during_fetch_is_not_overwritten() {
        let source = Arc::new(ScriptedSource::new(vec![(10, Ok(10.0)), (100, Ok(20.0))]));
        let session = session(source);

        let generation = session.edit_field(EditDirection::Mithqals, "1");
        let mut first = Box::pin(session.recalculate(generation));
        assert!(futures::poll!(&mut first).is_pending());

        // The first run's price lands after this edit but before the run
        // for it has been polled.
        let generation = session.edit_field(EditDirection::Money, "500");
        assert_eq!(first.await, RecalcOutcome::Superseded);
        assert_eq!(session.snapshot().money, "500");

        assert_eq!(session.recalculate(generation).await, RecalcOutcome::Written(25.0));
        let form = session.snapshot();
        assert_eq!(form.money, "500");
        assert_eq!(form.mithqals, "25.00");
    }
}
