use std::collections::BTreeMap;

use crate::models::TrendPoint;

pub const MAX_SEMESTER: u32 = 8;

/// Raw trend payload: cohort year -> semester number -> average GPA, both
/// keyed by strings as they arrive over JSON. A `null` GPA marks a gap.
pub type SparseTrend = BTreeMap<String, BTreeMap<String, Option<f64>>>;

/// Turns the sparse per-cohort map into one row per semester. A cohort only
/// appears in a row when it has an entry for that semester; nothing is filled
/// in and explicit nulls stay null. Rows after the last semester with any
/// entry are dropped.
pub fn reshape(raw: &SparseTrend) -> Vec<TrendPoint> {
    let mut rows: Vec<TrendPoint> = (1..=MAX_SEMESTER)
        .map(|semester| TrendPoint {
            semester,
            per_cohort_gpa: BTreeMap::new(),
        })
        .collect();

    for (cohort, semesters) in raw {
        let Ok(cohort_year) = cohort.trim().parse::<i32>() else {
            continue;
        };
        for (semester, gpa) in semesters {
            let Ok(semester) = semester.trim().parse::<u32>() else {
                continue;
            };
            if !(1..=MAX_SEMESTER).contains(&semester) {
                continue;
            }
            rows[(semester - 1) as usize]
                .per_cohort_gpa
                .insert(cohort_year, *gpa);
        }
    }

    while rows.last().is_some_and(|row| row.per_cohort_gpa.is_empty()) {
        rows.pop();
    }
    rows
}

/// Dense table with explicit gaps, as served by the mock endpoint.
pub fn dense_table(cohorts: &[i32], rows: &[(u32, &[Option<f64>])]) -> Vec<TrendPoint> {
    rows.iter()
        .map(|(semester, values)| TrendPoint {
            semester: *semester,
            per_cohort_gpa: cohorts.iter().copied().zip(values.iter().copied()).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sparse(entries: &[(&str, &[(&str, f64)])]) -> SparseTrend {
        entries
            .iter()
            .map(|(cohort, values)| {
                let inner = values.iter().map(|(s, v)| (s.to_string(), Some(*v))).collect();
                (cohort.to_string(), inner)
            })
            .collect()
    }

    #[test]
    fn missing_cohort_is_omitted_not_zeroed() {
        let raw = sparse(&[("2020", &[("1", 3.4), ("2", 3.45)]), ("2021", &[("1", 3.5)])]);
        let rows = reshape(&raw);

        assert_eq!(rows.len(), 2);
        let json = serde_json::to_value(&rows).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                { "semester": 1, "2020": 3.4, "2021": 3.5 },
                { "semester": 2, "2020": 3.45 }
            ])
        );
    }

    #[test]
    fn interior_gaps_are_kept_trailing_dropped() {
        let raw = sparse(&[("2020", &[("1", 3.1), ("3", 3.3)])]);
        let rows = reshape(&raw);

        assert_eq!(rows.len(), 3);
        assert!(rows[1].per_cohort_gpa.is_empty());
        assert_eq!(rows[2].per_cohort_gpa.get(&2020), Some(&Some(3.3)));
    }

    #[test]
    fn out_of_range_and_bad_keys_are_ignored() {
        let raw = sparse(&[
            ("2020", &[("0", 3.0), ("9", 3.9), ("x", 2.0), ("8", 3.8)]),
            ("angkatan", &[("1", 1.0)]),
        ]);
        let rows = reshape(&raw);

        assert_eq!(rows.len(), 8);
        assert!(rows[..7].iter().all(|r| r.per_cohort_gpa.is_empty()));
        assert_eq!(rows[7].per_cohort_gpa.get(&2020), Some(&Some(3.8)));
    }

    #[test]
    fn null_entries_decode_as_gaps() {
        let raw: SparseTrend = serde_json::from_str(
            r#"{"2020":{"1":3.4,"2":3.45},"2021":{"1":3.5,"2":null}}"#,
        )
        .unwrap();
        let rows = reshape(&raw);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].per_cohort_gpa.get(&2021), Some(&None));
        assert_eq!(
            serde_json::to_value(&rows[1]).unwrap(),
            serde_json::json!({ "semester": 2, "2020": 3.45, "2021": null })
        );
    }

    #[test]
    fn empty_input_gives_no_rows() {
        assert!(reshape(&SparseTrend::new()).is_empty());
    }

    #[test]
    fn dense_table_serialises_nulls() {
        let rows = dense_table(&[2020, 2021], &[(4, &[Some(3.55), None])]);
        let json = serde_json::to_value(&rows).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{ "semester": 4, "2020": 3.55, "2021": null }])
        );
    }
}
