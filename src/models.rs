use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Credits a student must hold before the thesis (TA) can be taken.
pub const THESIS_CREDIT_THRESHOLD: i32 = 110;
pub const MAX_CREDITS: i32 = 148;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadyState {
    #[serde(rename = "Siap TA")]
    Ready,
    #[serde(rename = "Belum Siap")]
    NotReady,
}

impl ReadyState {
    pub fn from_credits(credits: i32) -> Self {
        if credits >= THESIS_CREDIT_THRESHOLD {
            ReadyState::Ready
        } else {
            ReadyState::NotReady
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReadyState::Ready => "Siap TA",
            ReadyState::NotReady => "Belum Siap",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: String,
    #[serde(rename = "nama")]
    pub name: String,
    #[serde(rename = "angkatan")]
    pub cohort_year: i32,
    #[serde(rename = "ipk")]
    pub gpa: f64,
    #[serde(rename = "sks")]
    pub credits_earned: i32,
    pub ready: ReadyState,
}

/// Subject-area (RMK) axes of the competency radar, in canonical display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CompetencySubject {
    Rpl,
    Kcv,
    Kbj,
    Netics,
    Giga,
    Mci,
    Pkt,
    Alpro,
}

impl CompetencySubject {
    pub const ALL: [CompetencySubject; 8] = [
        CompetencySubject::Rpl,
        CompetencySubject::Kcv,
        CompetencySubject::Kbj,
        CompetencySubject::Netics,
        CompetencySubject::Giga,
        CompetencySubject::Mci,
        CompetencySubject::Pkt,
        CompetencySubject::Alpro,
    ];

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.code().eq_ignore_ascii_case(code.trim()))
    }

    pub fn code(self) -> &'static str {
        match self {
            CompetencySubject::Rpl => "RPL",
            CompetencySubject::Kcv => "KCV",
            CompetencySubject::Kbj => "KBJ",
            CompetencySubject::Netics => "NETICS",
            CompetencySubject::Giga => "GIGA",
            CompetencySubject::Mci => "MCI",
            CompetencySubject::Pkt => "PKT",
            CompetencySubject::Alpro => "ALPRO",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            CompetencySubject::Rpl => "Rekayasa Perangkat Lunak",
            CompetencySubject::Kcv => "Komputasi Cerdas Visi",
            CompetencySubject::Kbj => "Komputasi Berbasis Jaringan",
            CompetencySubject::Netics => "Teknologi Jaringan & Keamanan",
            CompetencySubject::Giga => "Grafika, Interaksi, & Gim",
            CompetencySubject::Mci => "Manajemen Cerdas Informasi",
            CompetencySubject::Pkt => "Pemodelan & Komputasi Terapan",
            CompetencySubject::Alpro => "Algoritma Pemrograman",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            CompetencySubject::Rpl => "#3b82f6",
            CompetencySubject::Kcv => "#10b981",
            CompetencySubject::Kbj => "#06b6d4",
            CompetencySubject::Netics => "#6366f1",
            CompetencySubject::Giga => "#d946ef",
            CompetencySubject::Mci => "#f97316",
            CompetencySubject::Pkt => "#ef4444",
            CompetencySubject::Alpro => "#eab308",
        }
    }
}

/// Which subject, if any, a generated profile leans towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    Subject(CompetencySubject),
    /// Uniformly elevated, no single dominant subject.
    AllGood,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompetencyScore {
    pub subject: CompetencySubject,
    pub score: i32,
}

impl Serialize for CompetencyScore {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("CompetencyScore", 5)?;
        state.serialize_field("rmk", self.subject.code())?;
        state.serialize_field("fullName", self.subject.display_name())?;
        state.serialize_field("score", &self.score)?;
        state.serialize_field("fullMark", &100)?;
        state.serialize_field("color", self.subject.color())?;
        state.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortDistribution {
    pub cohort_year: i32,
    pub total: usize,
    pub eligible: usize,
}

/// Target split the distribution-matching generator must reproduce exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CohortTarget {
    pub total: usize,
    pub eligible: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulationAggregate {
    pub total: usize,
    pub eligible_count: usize,
    pub avg_gpa: f64,
    pub avg_credits: f64,
}

/// One row of the multi-series GPA line chart. A cohort missing from
/// `per_cohort_gpa` has no data for this semester and renders as a gap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub semester: u32,
    #[serde(flatten)]
    pub per_cohort_gpa: BTreeMap<i32, Option<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Grade {
    A,
    AB,
    B,
    BC,
    C,
    D,
}

impl Grade {
    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::AB => "AB",
            Grade::B => "B",
            Grade::BC => "BC",
            Grade::C => "C",
            Grade::D => "D",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptEntry {
    pub subject: CompetencySubject,
    pub score: i32,
    pub grade: Grade,
}

/// Headline KPIs of the population view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_students: usize,
    pub eligible_students: usize,
    pub avg_gpa: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallStats {
    pub total_mhs: usize,
    pub eligible_mhs: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabShare {
    pub label: String,
    pub percentage: f64,
}
