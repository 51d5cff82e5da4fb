use std::collections::BTreeSet;
use std::fmt::Write;

use chrono::NaiveDate;

use crate::competency::{self, CompetencyProfile};
use crate::eligibility;
use crate::models::{CohortDistribution, StudentRecord, TranscriptEntry, TrendPoint};
use crate::source::PopulationView;

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

pub fn trend_table(trends: &[TrendPoint]) -> String {
    let cohorts: BTreeSet<i32> = trends
        .iter()
        .flat_map(|row| row.per_cohort_gpa.keys().copied())
        .collect();

    let mut output = String::new();
    let _ = write!(output, "| Semester |");
    for cohort in &cohorts {
        let _ = write!(output, " {cohort} |");
    }
    let _ = writeln!(output);
    let _ = write!(output, "|---|");
    for _ in &cohorts {
        let _ = write!(output, "---|");
    }
    let _ = writeln!(output);

    for row in trends {
        let _ = write!(output, "| {} |", row.semester);
        for cohort in &cohorts {
            match row.per_cohort_gpa.get(cohort).copied().flatten() {
                Some(gpa) => {
                    let _ = write!(output, " {gpa:.2} |");
                }
                None => {
                    let _ = write!(output, " - |");
                }
            }
        }
        let _ = writeln!(output);
    }

    output
}

fn write_distribution(output: &mut String, distribution: &[CohortDistribution]) {
    if distribution.is_empty() {
        let _ = writeln!(output, "No cohort data available.");
        return;
    }
    for cohort in distribution {
        let _ = writeln!(
            output,
            "- {}: {} of {} ready for TA ({:.1}%)",
            cohort.cohort_year,
            cohort.eligible,
            cohort.total,
            percent(cohort.eligible, cohort.total)
        );
    }
}

fn top_by_gpa(students: &[StudentRecord], limit: usize) -> Vec<&StudentRecord> {
    let mut sorted: Vec<&StudentRecord> = students.iter().collect();
    sorted.sort_by(|a, b| b.gpa.partial_cmp(&a.gpa).unwrap_or(std::cmp::Ordering::Equal));
    sorted.truncate(limit);
    sorted
}

pub fn build_population_report(
    view: &PopulationView,
    cohort: Option<i32>,
    generated_on: NaiveDate,
) -> String {
    let students = eligibility::filter_by_cohort(&view.students.value, cohort);
    let kpis = eligibility::resolve_kpis(Some(&view.summary.value), &view.students.value, cohort);
    let (eligible, not_yet) = kpis.eligibility_split();

    let distribution: Vec<CohortDistribution> = view
        .distribution
        .value
        .iter()
        .filter(|d| cohort.map_or(true, |year| d.cohort_year == year))
        .copied()
        .collect();

    let mut output = String::new();
    let cohort_label = cohort.map_or_else(|| "all cohorts".to_string(), |y| format!("cohort {y}"));

    let _ = writeln!(output, "# Monitoring Mahasiswa");
    let _ = writeln!(output, "Generated for {} on {}", cohort_label, generated_on);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Key Figures");
    let _ = writeln!(output, "- Students: {}", kpis.total);
    let _ = writeln!(
        output,
        "- Ready for TA: {} ({:.1}%), not yet: {}",
        eligible,
        percent(eligible, kpis.total),
        not_yet
    );
    let _ = writeln!(output, "- Average GPA: {:.2}", kpis.avg_gpa);
    let _ = writeln!(output, "- Average credits: {}", kpis.avg_credits);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Data Sources");
    let _ = writeln!(output, "- summary: {}", view.summary.tier);
    let _ = writeln!(output, "- trends: {}", view.trends.tier);
    let _ = writeln!(output, "- distribution: {}", view.distribution.tier);
    let _ = writeln!(output, "- students: {}", view.students.tier);

    let _ = writeln!(output);
    let _ = writeln!(output, "## TA Eligibility by Cohort");
    write_distribution(&mut output, &distribution);

    let _ = writeln!(output);
    let _ = writeln!(output, "## GPA Trend by Semester");
    if view.trends.value.is_empty() {
        let _ = writeln!(output, "No trend data available.");
    } else {
        output.push_str(&trend_table(&view.trends.value));
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Highest GPA");
    if students.is_empty() {
        let _ = writeln!(output, "No students in this view.");
    } else {
        for student in top_by_gpa(&students, 5) {
            let _ = writeln!(
                output,
                "- {} ({}, {}) GPA {:.2}, {} credits, {}",
                student.name,
                student.id,
                student.cohort_year,
                student.gpa,
                student.credits_earned,
                eligibility::classify(student).label()
            );
        }
    }

    output
}

/// Renders the competency view. `None` is the empty state for an unknown
/// student identifier.
pub fn build_competency_report(
    query: &str,
    profile: Option<&CompetencyProfile>,
    transcript: &[TranscriptEntry],
) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Profil Kompetensi");

    let Some(profile) = profile else {
        let _ = writeln!(output, "Data Mahasiswa Tidak Ditemukan: {query}");
        let _ = writeln!(output, "Silakan masukkan NRP yang valid.");
        return output;
    };

    let _ = writeln!(output, "{}", profile.title);
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Top recommendation: {}",
        competency::recommendation(&profile.scores).unwrap_or("-")
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Detail Performa RMK");
    for score in competency::rank(&profile.scores) {
        let _ = writeln!(
            output,
            "- {} ({}): {}",
            score.subject.code(),
            score.subject.display_name(),
            score.score
        );
    }

    let top: Vec<&str> = competency::top_recommendations(&profile.scores, 3)
        .iter()
        .map(|s| s.subject.code())
        .collect();
    let _ = writeln!(output);
    let _ = writeln!(output, "Strongest areas: {}", top.join(", "));

    if !transcript.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Transcript");
        for entry in transcript {
            let _ = writeln!(
                output,
                "- {}: {} ({})",
                entry.subject.code(),
                entry.score,
                entry.grade.as_str()
            );
        }
    }

    output
}
