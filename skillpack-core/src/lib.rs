//! Core library for the `skillpack` CLI.
//!
//! This crate is a collection of independent assistant skills, each a thin
//! adapter over one external service:
//! - Weather advisories (umbrella, laundry, heat-risk) via OpenWeatherMap
//! - LINE push messages and webhook parsing
//! - Lightweight Notion page/database access
//! - Rakuten Ichiba product search and price comparison
//! - Mercari listing text generation (offline)
//!
//! Skills share nothing but the config file and the input-error type; each
//! one is constructed with its own credentials and owns its own HTTP client.

pub mod config;
pub mod error;
mod http;
pub mod line;
pub mod mercari;
pub mod notion;
pub mod rakuten;
pub mod weather;

pub use config::Config;
pub use error::SkillError;
pub use line::LineMessenger;
pub use mercari::MercariLister;
pub use notion::NotionLite;
pub use rakuten::RakutenShopping;
pub use weather::WeatherAdvisor;
