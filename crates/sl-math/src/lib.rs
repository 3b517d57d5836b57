//! Slotlight math utilities.

pub mod math;

pub use math::bayes_factor;
pub use math::binomial;
pub use math::normalize::*;
pub use math::stable::*;
