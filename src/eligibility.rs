use std::collections::BTreeMap;

use crate::models::{
    CohortDistribution, DashboardSummary, PopulationAggregate, ReadyState, StudentRecord,
};

pub fn classify(student: &StudentRecord) -> ReadyState {
    ReadyState::from_credits(student.credits_earned)
}

pub fn aggregate(students: &[StudentRecord]) -> PopulationAggregate {
    let total = students.len();
    let eligible_count = students
        .iter()
        .filter(|s| classify(s) == ReadyState::Ready)
        .count();

    let (avg_gpa, avg_credits) = if total == 0 {
        (0.0, 0.0)
    } else {
        let gpa_sum: f64 = students.iter().map(|s| s.gpa).sum();
        let credit_sum: i64 = students.iter().map(|s| s.credits_earned as i64).sum();
        (gpa_sum / total as f64, credit_sum as f64 / total as f64)
    };

    PopulationAggregate {
        total,
        eligible_count,
        avg_gpa,
        avg_credits,
    }
}

pub fn distribution_by_cohort(students: &[StudentRecord]) -> Vec<CohortDistribution> {
    let mut map: BTreeMap<i32, (usize, usize)> = BTreeMap::new();

    for student in students {
        let entry = map.entry(student.cohort_year).or_insert((0, 0));
        entry.0 += 1;
        if classify(student) == ReadyState::Ready {
            entry.1 += 1;
        }
    }

    map.into_iter()
        .map(|(cohort_year, (total, eligible))| CohortDistribution {
            cohort_year,
            total,
            eligible,
        })
        .collect()
}

pub fn filter_by_cohort(students: &[StudentRecord], cohort: Option<i32>) -> Vec<StudentRecord> {
    match cohort {
        None => students.to_vec(),
        Some(year) => students
            .iter()
            .filter(|s| s.cohort_year == year)
            .cloned()
            .collect(),
    }
}

/// Headline numbers shown above the charts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kpis {
    pub total: usize,
    pub eligible: usize,
    pub avg_gpa: f64,
    pub avg_credits: i64,
}

impl Kpis {
    /// Gauge split: (eligible, not yet eligible).
    pub fn eligibility_split(&self) -> (usize, usize) {
        (self.eligible, self.total.saturating_sub(self.eligible))
    }
}

/// Summary figures win for the whole population; a cohort filter always
/// recomputes from the filtered rows. Average credits come from the rows
/// either way and are floored for display.
pub fn resolve_kpis(
    summary: Option<&DashboardSummary>,
    students: &[StudentRecord],
    cohort: Option<i32>,
) -> Kpis {
    let filtered = filter_by_cohort(students, cohort);
    let local = aggregate(&filtered);
    let avg_credits = local.avg_credits.floor() as i64;

    match (summary, cohort) {
        (Some(summary), None) if summary.total_students > 0 => Kpis {
            total: summary.total_students,
            eligible: summary.eligible_students,
            avg_gpa: summary.avg_gpa,
            avg_credits,
        },
        _ => Kpis {
            total: local.total,
            eligible: local.eligible_count,
            avg_gpa: local.avg_gpa,
            avg_credits,
        },
    }
}
