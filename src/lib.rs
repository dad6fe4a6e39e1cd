pub mod aggregate;
pub mod args;
pub mod commands;
mod config;
pub mod controller;
mod db;
mod error;
pub mod export;
pub mod filter;
pub mod model;
pub mod notify;
mod utils;

#[cfg(test)]
mod test;

pub use config::{Config, NotifySettings};
pub use error::{Error, ErrorType, MalformedRecord, NotificationDeliveryError, Result, StoreError};
pub use notify::Mode;
