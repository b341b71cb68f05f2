//! Core business logic abstractions

pub mod cache;
pub mod config;
pub mod convert;
pub mod error;
pub mod generation;
pub mod log;
pub mod quote;
pub mod router;
pub mod session;
pub mod source;

// Re-export main types for cleaner imports
pub use cache::{CachedQuote, Clock, QuoteCache, SystemClock};
pub use error::{FetchError, ParseError};
pub use quote::{Currency, MetalType};
pub use router::{InputEvent, InputRouter};
pub use session::{ConversionSession, EditDirection, Form, RecalcOutcome};
pub use source::{CurrencyRateProvider, FailurePolicy, MetalPriceProvider, QuoteSource, RateSource};
