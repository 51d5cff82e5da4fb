use std::path::Path;

use anyhow::Context;
use serde::Serialize;

use crate::models::{ReadyState, StudentRecord, TranscriptEntry, MAX_CREDITS};

pub fn write_students(path: &Path, students: &[StudentRecord]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for student in students {
        writer.serialize(student)?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads student rows back. Credits are clamped and the readiness label is
/// recomputed, so hand-edited files cannot disagree with the 110-credit rule.
pub fn read_students(path: &Path) -> anyhow::Result<Vec<StudentRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut students = Vec::new();

    for (line, result) in reader.deserialize::<StudentRecord>().enumerate() {
        let mut student = result.with_context(|| format!("bad student row {}", line + 1))?;
        let credits = student.credits_earned.clamp(0, MAX_CREDITS);
        let ready = ReadyState::from_credits(credits);
        if credits != student.credits_earned || ready != student.ready {
            tracing::warn!(id = %student.id, "normalising student row");
        }
        student.credits_earned = credits;
        student.ready = ready;
        students.push(student);
    }

    Ok(students)
}

#[derive(Serialize)]
struct TranscriptRow<'a> {
    kode_mhs: &'a str,
    rmk: &'static str,
    nama_rmk: &'static str,
    nilai_akhir: i32,
    nilai_huruf: &'static str,
}

pub fn write_transcript(path: &Path, nrp: &str, entries: &[TranscriptEntry]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for entry in entries {
        writer.serialize(TranscriptRow {
            kode_mhs: nrp,
            rmk: entry.subject.code(),
            nama_rmk: entry.subject.display_name(),
            nilai_akhir: entry.score,
            nilai_huruf: entry.grade.as_str(),
        })?;
    }
    writer.flush()?;
    Ok(())
}
