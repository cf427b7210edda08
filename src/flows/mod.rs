pub mod annuity;
pub mod composed;
pub mod onramp;
