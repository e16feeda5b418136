//! Weekly allocation view assembly.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::HolidayMap;
use crate::models::{AllocationDetail, WeeklyAssignment, WeeklyDay};

/// Groups a project's allocations by date and shift code.
///
/// A date appears when it has at least one allocation or a holiday. The day
/// is approved only if every allocation on it is approved; the approver and
/// timestamp come from the most recently updated allocation.
pub fn weekly_view(details: &[AllocationDetail], holidays: &HolidayMap) -> Vec<WeeklyDay> {
    let mut days: BTreeMap<NaiveDate, WeeklyDay> = BTreeMap::new();

    for detail in details {
        let day = days
            .entry(detail.shift_date)
            .or_insert_with(|| empty_day(detail.shift_date, holidays));

        day.shifts
            .entry(detail.shift_code.clone())
            .or_default()
            .push(WeeklyAssignment {
                allocation_id: detail.allocation_id,
                emp_id: detail.emp_id,
                emp_name: detail.emp_name.clone(),
                emp_lname: detail.emp_lname.clone(),
            });

        day.is_approved &= detail.is_approved;
        if day.last_updated.is_none_or(|seen| detail.last_updated >= seen) {
            day.last_updated = Some(detail.last_updated);
            if detail.approver_name.is_some() {
                day.approved_by = detail.approver_name.clone();
            }
        }
    }

    for date in holidays.keys() {
        days.entry(*date).or_insert_with(|| {
            let mut day = empty_day(*date, holidays);
            day.is_approved = false;
            day
        });
    }

    days.into_values().collect()
}

fn empty_day(date: NaiveDate, holidays: &HolidayMap) -> WeeklyDay {
    WeeklyDay {
        date,
        shifts: BTreeMap::new(),
        is_approved: true,
        approved_by: None,
        last_updated: None,
        holiday: holidays.get(&date).cloned(),
    }
}
