//! Synthetic student rows for the mock server and for the population view
//! when only per-cohort counts are known.
//!
//! Every function takes the random source as an argument so callers can pin
//! a seed (`StdRng::seed_from_u64`) and get the same dataset back.

use std::collections::BTreeMap;

use rand::Rng;

use crate::models::{CohortTarget, ReadyState, StudentRecord, MAX_CREDITS};

/// Year the credit trajectory is measured against.
pub const DEFAULT_REFERENCE_YEAR: i32 = 2024;
pub const CREDITS_PER_SEMESTER: i32 = 18;

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn student_id(cohort_year: i32, index: usize) -> String {
    format!("5025{cohort_year}{index:03}")
}

/// Credits a student of `cohort_year` would hold after a regular study load.
pub fn baseline_credits(cohort_year: i32, reference_year: i32) -> i32 {
    reference_year
        .saturating_sub(cohort_year)
        .saturating_mul(2 * CREDITS_PER_SEMESTER)
}

pub fn generate_students<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    cohorts: &[i32],
    reference_year: i32,
) -> Vec<StudentRecord> {
    if cohorts.is_empty() {
        return Vec::new();
    }

    (0..count)
        .map(|i| {
            let cohort_year = cohorts[rng.random_range(0..cohorts.len())];
            let noise = rng.random_range(0..20) - 10;
            let credits = baseline_credits(cohort_year, reference_year)
                .saturating_add(noise)
                .clamp(0, MAX_CREDITS);

            StudentRecord {
                id: student_id(cohort_year, i),
                name: format!("Mahasiswa {}", i + 1),
                cohort_year,
                gpa: round2(2.5 + rng.random::<f64>() * 1.5),
                credits_earned: credits,
                ready: ReadyState::from_credits(credits),
            }
        })
        .collect()
}

/// Builds a population that reproduces each cohort's eligible/total split
/// exactly. Eligible rows get 110..=144 credits and a GPA in [3.0, 4.0);
/// the rest stay below the threshold with a GPA in [2.0, 3.5).
pub fn generate_matching<R: Rng + ?Sized>(
    rng: &mut R,
    targets: &BTreeMap<i32, CohortTarget>,
    reference_year: i32,
) -> Vec<StudentRecord> {
    let mut students = Vec::new();

    for (&cohort_year, target) in targets {
        let eligible = target.eligible.min(target.total);
        let not_eligible = target.total - eligible;

        for i in 0..eligible {
            let credits = 110 + rng.random_range(0..35);
            students.push(StudentRecord {
                id: student_id(cohort_year, i),
                name: format!("Mahasiswa {}-{}", cohort_year, i + 1),
                cohort_year,
                gpa: round2(3.0 + rng.random::<f64>()),
                credits_earned: credits,
                ready: ReadyState::Ready,
            });
        }

        for i in 0..not_eligible {
            let index = eligible + i;
            let base = reference_year.saturating_sub(cohort_year).saturating_mul(20);
            let credits = base.saturating_add(rng.random_range(0..30)).clamp(10, 109);
            students.push(StudentRecord {
                id: student_id(cohort_year, index),
                name: format!("Mahasiswa {}-{}", cohort_year, index + 1),
                cohort_year,
                gpa: round2(2.0 + rng.random::<f64>() * 1.5),
                credits_earned: credits,
                ready: ReadyState::NotReady,
            });
        }
    }

    students.sort_by_key(|s| s.cohort_year);
    students
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::models::THESIS_CREDIT_THRESHOLD;

    #[test]
    fn generated_records_respect_credit_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let students = generate_students(&mut rng, 500, &[2018, 2020, 2021, 2022, 2023], 2024);

        assert_eq!(students.len(), 500);
        for s in &students {
            assert!((0..=MAX_CREDITS).contains(&s.credits_earned));
            assert_eq!(
                s.ready == ReadyState::Ready,
                s.credits_earned >= THESIS_CREDIT_THRESHOLD
            );
            assert!(s.gpa >= 2.5 && s.gpa <= 4.0, "gpa {}", s.gpa);
        }
    }

    #[test]
    fn generated_ids_are_unique() {
        let mut rng = StdRng::seed_from_u64(11);
        let students = generate_students(&mut rng, 200, &[2020, 2021, 2022, 2023], 2024);
        let ids: HashSet<_> = students.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids.len(), students.len());
    }

    #[test]
    fn same_seed_reproduces_dataset() {
        let a = generate_students(&mut StdRng::seed_from_u64(3), 50, &[2020, 2023], 2024);
        let b = generate_students(&mut StdRng::seed_from_u64(3), 50, &[2020, 2023], 2024);
        assert_eq!(a, b);
    }

    #[test]
    fn credits_follow_cohort_trajectory() {
        let mut rng = StdRng::seed_from_u64(5);
        let students = generate_students(&mut rng, 100, &[2023], 2024);
        for s in &students {
            assert!((26..=45).contains(&s.credits_earned), "{}", s.credits_earned);
        }
    }

    #[test]
    fn empty_cohort_set_yields_nothing() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(generate_students(&mut rng, 10, &[], 2024).is_empty());
    }

    #[test]
    fn matching_generation_reproduces_exact_split() {
        let mut targets = BTreeMap::new();
        targets.insert(2020, CohortTarget { total: 310, eligible: 82 });
        let mut rng = StdRng::seed_from_u64(42);

        let students = generate_matching(&mut rng, &targets, 2024);

        assert_eq!(students.len(), 310);
        assert!(students.iter().all(|s| s.cohort_year == 2020));
        let ready: Vec<_> = students.iter().filter(|s| s.credits_earned >= 110).collect();
        assert_eq!(ready.len(), 82);
        assert!(ready
            .iter()
            .all(|s| s.credits_earned <= 145 && s.gpa >= 3.0 && s.gpa <= 4.0));
        let rest: Vec<_> = students.iter().filter(|s| s.credits_earned < 110).collect();
        assert_eq!(rest.len(), 228);
        assert!(rest
            .iter()
            .all(|s| s.credits_earned >= 10 && s.gpa >= 2.0 && s.gpa <= 3.5));
    }

    #[test]
    fn matching_generation_sorts_by_cohort() {
        let mut targets = BTreeMap::new();
        targets.insert(2022, CohortTarget { total: 3, eligible: 1 });
        targets.insert(2020, CohortTarget { total: 2, eligible: 2 });
        let mut rng = StdRng::seed_from_u64(9);

        let students = generate_matching(&mut rng, &targets, 2024);
        let years: Vec<_> = students.iter().map(|s| s.cohort_year).collect();
        assert_eq!(years, vec![2020, 2020, 2022, 2022, 2022]);
        assert_eq!(students[2].id, "50252022000");
    }

    #[test]
    fn absurd_cohort_years_stay_in_range() {
        assert_eq!(baseline_credits(-2_000_000_000, 2024), i32::MAX);
        assert_eq!(baseline_credits(i32::MAX, 2024), i32::MIN);

        let mut targets = BTreeMap::new();
        targets.insert(-2_000_000_000, CohortTarget { total: 3, eligible: 0 });
        targets.insert(i32::MAX, CohortTarget { total: 3, eligible: 0 });
        let mut rng = StdRng::seed_from_u64(8);
        let students = generate_matching(&mut rng, &targets, 2024);
        assert_eq!(students.len(), 6);
        assert!(students.iter().all(|s| (10..=109).contains(&s.credits_earned)));

        let students = generate_students(&mut rng, 20, &[-2_000_000_000, i32::MAX], 2024);
        assert!(students
            .iter()
            .all(|s| (0..=MAX_CREDITS).contains(&s.credits_earned)));
    }

    #[test]
    fn eligible_above_total_is_capped() {
        let mut targets = BTreeMap::new();
        targets.insert(2021, CohortTarget { total: 4, eligible: 9 });
        let mut rng = StdRng::seed_from_u64(2);

        let students = generate_matching(&mut rng, &targets, 2024);
        assert_eq!(students.len(), 4);
        assert!(students.iter().all(|s| s.ready == ReadyState::Ready));
    }
}
