//! Competency radar model: per-subject scores, ranking and the simulated
//! profile database behind the competency view.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::{Bias, CompetencyScore, CompetencySubject, Grade, TranscriptEntry};

pub const BASE_SCORE: f64 = 75.0;
pub const BIAS_BONUS: f64 = 15.0;
pub const ALL_GOOD_BONUS: f64 = 10.0;

/// Identifiers shorter than this never get a synthetic profile.
pub const MIN_SYNTHETIC_ID_LEN: usize = 10;

pub fn generate_scores<R: Rng + ?Sized>(
    rng: &mut R,
    bias: Bias,
    variance: f64,
) -> Vec<CompetencyScore> {
    CompetencySubject::ALL
        .iter()
        .map(|&subject| {
            let mut base = BASE_SCORE;
            if bias == Bias::Subject(subject) {
                base += BIAS_BONUS;
            }
            if bias == Bias::AllGood {
                base += ALL_GOOD_BONUS;
            }

            let noise = rng.random::<f64>() * variance - variance / 2.0;
            let score = ((base + noise).floor() as i32).clamp(0, 100);
            CompetencyScore { subject, score }
        })
        .collect()
}

/// Highest score first; equal scores keep canonical subject order.
pub fn rank(scores: &[CompetencyScore]) -> Vec<CompetencyScore> {
    let mut ranked = scores.to_vec();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked
}

pub fn top_recommendations(scores: &[CompetencyScore], k: usize) -> Vec<CompetencyScore> {
    rank(scores).into_iter().take(k).collect()
}

pub fn recommendation(scores: &[CompetencyScore]) -> Option<&'static str> {
    rank(scores).first().map(|s| s.subject.display_name())
}

pub fn grade_for(score: i32) -> Grade {
    match score {
        86..=i32::MAX => Grade::A,
        76..=85 => Grade::AB,
        66..=75 => Grade::B,
        61..=65 => Grade::BC,
        56..=60 => Grade::C,
        _ => Grade::D,
    }
}

/// Adds up to ±5 points of exam noise before mapping to a letter.
pub fn derive_grade<R: Rng + ?Sized>(rng: &mut R, score: i32) -> (i32, Grade) {
    let adjusted = (score + rng.random_range(-5..=5)).clamp(0, 100);
    (adjusted, grade_for(adjusted))
}

pub fn transcript<R: Rng + ?Sized>(
    rng: &mut R,
    scores: &[CompetencyScore],
) -> Vec<TranscriptEntry> {
    scores
        .iter()
        .map(|s| {
            let (score, grade) = derive_grade(rng, s.score);
            TranscriptEntry {
                subject: s.subject,
                score,
                grade,
            }
        })
        .collect()
}

/// Bias picked from the identifier's last digit, so the same NRP always maps
/// to the same dominant subject.
pub fn bias_from_identifier(identifier: &str) -> Bias {
    match identifier.chars().last().and_then(|c| c.to_digit(10)) {
        Some(digit) => Bias::Subject(CompetencySubject::ALL[digit as usize % 8]),
        None => Bias::None,
    }
}

fn identifier_seed(seed: u64, identifier: &str) -> u64 {
    // FNV-1a, stable across builds unlike the std hasher.
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in identifier.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash ^ seed
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    All,
    Batch(i32),
    Individual(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileOrigin {
    Overall,
    Batch,
    Known,
    Synthetic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompetencyProfile {
    pub title: String,
    pub origin: ProfileOrigin,
    pub scores: Vec<CompetencyScore>,
}

#[derive(Debug, Clone)]
pub struct KnownStudent {
    pub name: String,
    pub cohort_year: i32,
    pub scores: Vec<CompetencyScore>,
}

/// Immutable snapshot of every profile the competency view can show.
#[derive(Debug, Clone)]
pub struct CompetencyDatabase {
    seed: u64,
    overall: Vec<CompetencyScore>,
    batches: BTreeMap<i32, Vec<CompetencyScore>>,
    individuals: BTreeMap<String, KnownStudent>,
}

impl CompetencyDatabase {
    pub fn build(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        let overall = generate_scores(&mut rng, Bias::AllGood, 5.0);

        let batches = [
            (2020, CompetencySubject::Rpl),
            (2021, CompetencySubject::Kcv),
            (2022, CompetencySubject::Giga),
            (2023, CompetencySubject::Alpro),
        ]
        .into_iter()
        .map(|(year, subject)| (year, generate_scores(&mut rng, Bias::Subject(subject), 15.0)))
        .collect();

        let individuals = [
            ("5025211001", "Budi Santoso", CompetencySubject::Netics, 2021),
            ("5025211002", "Siti Aminah", CompetencySubject::Mci, 2021),
            ("5025221015", "Kevin Sanjaya", CompetencySubject::Kcv, 2022),
        ]
        .into_iter()
        .map(|(nrp, name, subject, cohort_year)| {
            let student = KnownStudent {
                name: name.to_string(),
                cohort_year,
                scores: generate_scores(&mut rng, Bias::Subject(subject), 5.0),
            };
            (nrp.to_string(), student)
        })
        .collect();

        Self {
            seed,
            overall,
            batches,
            individuals,
        }
    }

    pub fn batch_years(&self) -> impl Iterator<Item = i32> + '_ {
        self.batches.keys().copied()
    }

    pub fn known_student(&self, nrp: &str) -> Option<&KnownStudent> {
        self.individuals.get(nrp)
    }

    fn overall_profile(&self) -> CompetencyProfile {
        CompetencyProfile {
            title: "Rata-rata Keseluruhan Mahasiswa".to_string(),
            origin: ProfileOrigin::Overall,
            scores: self.overall.clone(),
        }
    }

    /// `None` means the identifier is unknown and too short to synthesise a
    /// profile for; the view shows its empty state.
    pub fn lookup(&self, scope: Scope<'_>) -> Option<CompetencyProfile> {
        match scope {
            Scope::All => Some(self.overall_profile()),
            Scope::Batch(year) => Some(match self.batches.get(&year) {
                Some(scores) => CompetencyProfile {
                    title: format!("Rata-rata Angkatan {year}"),
                    origin: ProfileOrigin::Batch,
                    scores: scores.clone(),
                },
                None => self.overall_profile(),
            }),
            Scope::Individual(nrp) => {
                let nrp = nrp.trim();
                if nrp.is_empty() {
                    return Some(self.overall_profile());
                }
                if let Some(student) = self.individuals.get(nrp) {
                    return Some(CompetencyProfile {
                        title: format!("{} ({})", student.name, nrp),
                        origin: ProfileOrigin::Known,
                        scores: student.scores.clone(),
                    });
                }
                if nrp.chars().count() < MIN_SYNTHETIC_ID_LEN {
                    return None;
                }

                let mut rng = StdRng::seed_from_u64(identifier_seed(self.seed, nrp));
                Some(CompetencyProfile {
                    title: format!("Mahasiswa {nrp}"),
                    origin: ProfileOrigin::Synthetic,
                    scores: generate_scores(&mut rng, bias_from_identifier(nrp), 20.0),
                })
            }
        }
    }
}
