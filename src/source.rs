//! Data behind the population view: the remote summary API plus the
//! constants and local synthesis used when it cannot be reached.
//!
//! Every resource goes through the same cascade (remote, fallback constant,
//! local synthesis) and records which tier produced it.

use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::eligibility;
use crate::generator;
use crate::models::{CohortDistribution, CohortTarget, DashboardSummary, StudentRecord, TrendPoint};
use crate::trend::{self, SparseTrend};

pub const DEFAULT_API_URL: &str = "https://farwew-tc.hf.space";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// The service could not be reached at all, as opposed to answering badly.
    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Transport { .. })
    }
}

#[allow(async_fn_in_trait)]
pub trait SummarySource {
    async fn dashboard_summary(&self) -> Result<DashboardSummary, FetchError>;
    async fn academic_trend(&self) -> Result<SparseTrend, FetchError>;
    async fn population_distribution(&self) -> Result<BTreeMap<i32, CohortTarget>, FetchError>;
}

#[derive(Deserialize)]
struct SummaryPayload {
    total_mahasiswa: usize,
    eligible_ta: EligiblePayload,
    ipk: GpaPayload,
}

#[derive(Deserialize)]
struct EligiblePayload {
    jumlah: usize,
}

#[derive(Deserialize)]
struct GpaPayload {
    rata_rata_ipk: f64,
}

pub struct HttpSummarySource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSummarySource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = format!("{}/{}", self.base_url, path);
        tracing::debug!(%url, "fetching");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url, status });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| FetchError::Decode { url, source })
    }
}

impl SummarySource for HttpSummarySource {
    async fn dashboard_summary(&self) -> Result<DashboardSummary, FetchError> {
        let payload: SummaryPayload = self.get_json("dashboard_summary").await?;
        Ok(DashboardSummary {
            total_students: payload.total_mahasiswa,
            eligible_students: payload.eligible_ta.jumlah,
            avg_gpa: payload.ipk.rata_rata_ipk,
        })
    }

    async fn academic_trend(&self) -> Result<SparseTrend, FetchError> {
        self.get_json("tren_performa_akademik").await
    }

    async fn population_distribution(&self) -> Result<BTreeMap<i32, CohortTarget>, FetchError> {
        let raw: BTreeMap<String, CohortTarget> = self.get_json("distribusi_populasi_ta").await?;
        Ok(raw
            .into_iter()
            .filter_map(|(year, target)| match year.trim().parse::<i32>() {
                Ok(year) => Some((year, target)),
                Err(_) => {
                    tracing::warn!(cohort = %year, "skipping non-numeric cohort key");
                    None
                }
            })
            .collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Remote,
    Fallback,
    Synthetic,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Tier::Remote => "remote",
            Tier::Fallback => "fallback",
            Tier::Synthetic => "synthetic",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub tier: Tier,
}

/// Resolution of one resource, tier by tier.
pub struct Cascade<T> {
    resource: &'static str,
    resolved: Option<Resolved<T>>,
    error: Option<FetchError>,
}

impl<T> Cascade<T> {
    pub fn remote(resource: &'static str, result: Result<T, FetchError>) -> Self {
        match result {
            Ok(value) => Self {
                resource,
                resolved: Some(Resolved {
                    value,
                    tier: Tier::Remote,
                }),
                error: None,
            },
            Err(err) => {
                tracing::warn!(resource, error = %err, "remote fetch failed");
                Self {
                    resource,
                    resolved: None,
                    error: Some(err),
                }
            }
        }
    }

    /// `fallback` sees the remote error and may decline by returning `None`.
    pub fn or_fallback(mut self, fallback: impl FnOnce(&FetchError) -> Option<T>) -> Self {
        if self.resolved.is_none() {
            if let Some(err) = &self.error {
                self.resolved = fallback(err).map(|value| Resolved {
                    value,
                    tier: Tier::Fallback,
                });
            }
        }
        self
    }

    pub fn or_synthesize(self, synthesize: impl FnOnce() -> T) -> Resolved<T> {
        let resolved = self.resolved.unwrap_or_else(|| Resolved {
            value: synthesize(),
            tier: Tier::Synthetic,
        });
        tracing::info!(resource = self.resource, tier = %resolved.tier, "resolved");
        resolved
    }
}

pub fn fallback_summary() -> DashboardSummary {
    DashboardSummary {
        total_students: 800,
        eligible_students: 300,
        avg_gpa: 3.25,
    }
}

pub fn fallback_trends() -> Vec<TrendPoint> {
    trend::dense_table(
        &[2020, 2021, 2022, 2023],
        &[
            (1, &[Some(3.4), Some(3.5), Some(3.6), Some(3.55)]),
            (2, &[Some(3.45), Some(3.52), Some(3.62), Some(3.58)]),
            (3, &[Some(3.5), Some(3.55), Some(3.58), Some(3.6)]),
            (4, &[Some(3.55), Some(3.58), Some(3.55), None]),
            (5, &[Some(3.6), Some(3.6), None, None]),
        ],
    )
}

/// Thirty percent of each fallback cohort counts as eligible.
pub fn fallback_distribution() -> BTreeMap<i32, CohortTarget> {
    [(2020, 180), (2021, 200), (2022, 210), (2023, 220)]
        .into_iter()
        .map(|(year, total)| {
            let eligible = total * 3 / 10;
            (year, CohortTarget { total, eligible })
        })
        .collect()
}

pub fn distribution_from_targets(targets: &BTreeMap<i32, CohortTarget>) -> Vec<CohortDistribution> {
    targets
        .iter()
        .map(|(&cohort_year, target)| CohortDistribution {
            cohort_year,
            total: target.total,
            eligible: target.eligible.min(target.total),
        })
        .collect()
}

/// Everything the population view renders, resolved once per load.
#[derive(Debug, Clone)]
pub struct PopulationView {
    pub summary: Resolved<DashboardSummary>,
    pub trends: Resolved<Vec<TrendPoint>>,
    pub distribution: Resolved<Vec<CohortDistribution>>,
    pub students: Resolved<Vec<StudentRecord>>,
}

pub async fn load_population<S, R>(source: &S, rng: &mut R, reference_year: i32) -> PopulationView
where
    S: SummarySource,
    R: Rng + ?Sized,
{
    let (summary, trend_raw, targets) = tokio::join!(
        source.dashboard_summary(),
        source.academic_trend(),
        source.population_distribution(),
    );

    let trends = Cascade::remote("trends", trend_raw.map(|raw| trend::reshape(&raw)))
        .or_fallback(|_| Some(fallback_trends()))
        .or_synthesize(Vec::new);

    let targets = Cascade::remote("distribution", targets)
        .or_fallback(|_| Some(fallback_distribution()))
        .or_synthesize(BTreeMap::new);

    let students = Resolved {
        value: generator::generate_matching(rng, &targets.value, reference_year),
        tier: Tier::Synthetic,
    };
    tracing::info!(
        resource = "students",
        tier = %students.tier,
        count = students.value.len(),
        "resolved"
    );

    // An unreachable service gets the fixed constants; a service that answered
    // badly gets figures computed from the synthesised rows.
    let summary = Cascade::remote("summary", summary)
        .or_fallback(|err| err.is_transport().then(fallback_summary))
        .or_synthesize(|| {
            let agg = eligibility::aggregate(&students.value);
            DashboardSummary {
                total_students: agg.total,
                eligible_students: agg.eligible_count,
                avg_gpa: generator::round2(agg.avg_gpa),
            }
        });

    let distribution = Resolved {
        value: distribution_from_targets(&targets.value),
        tier: targets.tier,
    };

    PopulationView {
        summary,
        trends,
        distribution,
        students,
    }
}

impl PopulationView {
    /// Replaces the synthesised rows with students read from a file. The
    /// distribution and the summary are recomputed from those rows so every
    /// figure in the view describes the same population.
    pub fn with_students(mut self, students: Vec<StudentRecord>) -> Self {
        let agg = eligibility::aggregate(&students);
        self.summary = Resolved {
            value: DashboardSummary {
                total_students: agg.total,
                eligible_students: agg.eligible_count,
                avg_gpa: generator::round2(agg.avg_gpa),
            },
            tier: Tier::Synthetic,
        };
        self.distribution = Resolved {
            value: eligibility::distribution_by_cohort(&students),
            tier: Tier::Synthetic,
        };
        self.students = Resolved {
            value: students,
            tier: Tier::Synthetic,
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn unavailable(path: &str) -> FetchError {
        FetchError::Status {
            url: format!("http://stub/{path}"),
            status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    struct StubSource {
        online: bool,
    }

    impl SummarySource for StubSource {
        async fn dashboard_summary(&self) -> Result<DashboardSummary, FetchError> {
            if self.online {
                Ok(DashboardSummary {
                    total_students: 1150,
                    eligible_students: 412,
                    avg_gpa: 3.31,
                })
            } else {
                Err(unavailable("dashboard_summary"))
            }
        }

        async fn academic_trend(&self) -> Result<SparseTrend, FetchError> {
            if !self.online {
                return Err(unavailable("tren_performa_akademik"));
            }
            let mut raw = SparseTrend::new();
            raw.insert(
                "2020".to_string(),
                [("1".to_string(), Some(3.4)), ("2".to_string(), Some(3.45))]
                    .into_iter()
                    .collect(),
            );
            raw.insert(
                "2021".to_string(),
                [("1".to_string(), Some(3.5)), ("2".to_string(), None)]
                    .into_iter()
                    .collect(),
            );
            Ok(raw)
        }

        async fn population_distribution(
            &self,
        ) -> Result<BTreeMap<i32, CohortTarget>, FetchError> {
            if !self.online {
                return Err(unavailable("distribusi_populasi_ta"));
            }
            let mut targets = BTreeMap::new();
            targets.insert(2020, CohortTarget { total: 310, eligible: 82 });
            targets.insert(2021, CohortTarget { total: 120, eligible: 10 });
            Ok(targets)
        }
    }

    #[tokio::test]
    async fn remote_data_is_used_when_available() {
        let mut rng = StdRng::seed_from_u64(1);
        let view = load_population(&StubSource { online: true }, &mut rng, 2024).await;

        assert_eq!(view.summary.tier, Tier::Remote);
        assert_eq!(view.summary.value.total_students, 1150);
        assert_eq!(view.trends.tier, Tier::Remote);
        assert_eq!(view.trends.value.len(), 2);
        assert_eq!(view.trends.value[1].per_cohort_gpa.get(&2021), Some(&None));
        assert_eq!(view.distribution.tier, Tier::Remote);
        assert_eq!(view.students.tier, Tier::Synthetic);
        assert_eq!(view.students.value.len(), 430);

        let computed = eligibility::distribution_by_cohort(&view.students.value);
        assert_eq!(computed, view.distribution.value);
    }

    #[tokio::test]
    async fn bad_responses_fall_back_per_resource() {
        let mut rng = StdRng::seed_from_u64(2);
        let view = load_population(&StubSource { online: false }, &mut rng, 2024).await;

        assert_eq!(view.trends.tier, Tier::Fallback);
        assert_eq!(view.trends.value, fallback_trends());
        assert_eq!(view.distribution.tier, Tier::Fallback);
        assert_eq!(view.distribution.value[0].total, 180);
        assert_eq!(view.distribution.value[0].eligible, 54);
        assert_eq!(view.students.value.len(), 810);

        // A non-2xx answer is not a transport failure, so the summary is
        // computed from the synthesised population.
        assert_eq!(view.summary.tier, Tier::Synthetic);
        assert_eq!(view.summary.value.total_students, 810);
        assert_eq!(view.summary.value.eligible_students, 54 + 60 + 63 + 66);
    }

    #[tokio::test]
    async fn unreachable_service_uses_constants() {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let source = HttpSummarySource::with_client(client, "http://127.0.0.1:9/");
        let mut rng = StdRng::seed_from_u64(3);
        let view = load_population(&source, &mut rng, 2024).await;

        assert_eq!(view.summary.tier, Tier::Fallback);
        assert_eq!(view.summary.value, fallback_summary());
        assert_eq!(view.trends.tier, Tier::Fallback);
        assert_eq!(view.distribution.tier, Tier::Fallback);
    }

    #[tokio::test]
    async fn students_from_file_replace_every_population_figure() {
        let mut rng = StdRng::seed_from_u64(4);
        let view = load_population(&StubSource { online: true }, &mut rng, 2024).await;
        let loaded = generator::generate_students(&mut rng, 12, &[2022, 2023], 2024);
        let agg = eligibility::aggregate(&loaded);

        let view = view.with_students(loaded.clone());

        assert_eq!(view.summary.tier, Tier::Synthetic);
        assert_eq!(view.summary.value.total_students, 12);
        assert_eq!(view.summary.value.eligible_students, agg.eligible_count);
        assert_eq!(view.summary.value.avg_gpa, generator::round2(agg.avg_gpa));
        assert_eq!(view.distribution.value, eligibility::distribution_by_cohort(&loaded));
        assert_eq!(view.students.value, loaded);
        assert_eq!(view.trends.tier, Tier::Remote);

        let kpis = eligibility::resolve_kpis(Some(&view.summary.value), &view.students.value, None);
        assert_eq!(kpis.total, 12);
    }

    #[test]
    fn cascade_stops_at_first_available_tier() {
        let resolved = Cascade::remote("n", Ok(1)).or_fallback(|_| Some(2)).or_synthesize(|| 3);
        assert_eq!(resolved, Resolved { value: 1, tier: Tier::Remote });

        let resolved = Cascade::remote("n", Err(unavailable("n")))
            .or_fallback(|_| Some(2))
            .or_synthesize(|| 3);
        assert_eq!(resolved, Resolved { value: 2, tier: Tier::Fallback });

        let resolved = Cascade::remote("n", Err(unavailable("n")))
            .or_fallback(|_| None)
            .or_synthesize(|| 3);
        assert_eq!(resolved, Resolved { value: 3, tier: Tier::Synthetic });
    }
}
