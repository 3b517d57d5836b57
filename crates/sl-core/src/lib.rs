//! Slotlight core library.
//!
//! Estimates which hidden setting a slot machine is running from counted
//! in-game events, using a binomial likelihood per event and a uniform prior
//! over the machine's settings.
//!
//! - [`estimate`]: the pure estimation engine
//! - [`session`]: counting-session state and persistence
//! - [`config`]: machine catalog loading
//! - [`logging`]: tracing setup shared by the CLI

pub mod config;
pub mod estimate;
pub mod exit_codes;
pub mod logging;
pub mod session;

pub use estimate::{estimate_settings, Observation, SettingEstimate};
pub use session::{SessionState, SessionStore};
