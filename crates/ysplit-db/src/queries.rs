//! Database query functions organized by domain.

pub mod audit;
pub mod categories;
pub mod executions;
pub mod rules;
pub mod settings;
pub mod spenders;
