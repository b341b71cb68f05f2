pub mod convert;
pub mod interactive;
pub mod prices;
pub mod setup;
pub mod ui;
