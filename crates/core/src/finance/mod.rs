//! Finance module - typed models and the facade over the collection store.

mod finance_model;
mod finance_service;

pub use finance_model::*;
pub use finance_service::{FacadeOptions, FinanceService};
