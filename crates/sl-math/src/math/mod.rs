//! Core math modules.

pub mod bayes_factor;
pub mod binomial;
pub mod normalize;
pub mod stable;
