//! Calculation logic for the shift roster engine.
//!
//! This module contains the pure, storage-free parts of allowance
//! reporting: canonical shift resolution, holiday map precedence, day
//! classification, cross-project rate merging, the aggregator that
//! assembles single-project, aggregate and detailed reports, and the weekly
//! allocation view.

mod aggregator;
mod day_classification;
mod holiday_map;
mod rate_merge;
mod resolver;
mod weekly;

pub use aggregator::{
    PricedAllocation, RateStrategy, aggregate_report, dedup_allocations, detailed_report,
    price_allocation, single_project_report,
};
pub use day_classification::{DayCategory, ShiftRates, classify_day, is_weekend};
pub use holiday_map::{HolidayMap, build_holiday_map};
pub use rate_merge::{merge_catalog, most_favorable_rates, project_catalog};
pub use resolver::resolve_shift;
pub use weekly::weekly_view;
