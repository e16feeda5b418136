//! Shift roster backend
//!
//! This crate manages per-project shift definitions whose allowance rates are
//! versioned over time, company and project holiday calendars, and a ledger
//! of employee shift allocations that leads approve. Approved allocations are
//! priced into payroll allowance reports for a single project, across
//! projects, or as a day-by-day breakdown.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod store;
