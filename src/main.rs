use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use rand::Rng;

mod competency;
mod config;
mod dataset;
mod eligibility;
mod generator;
mod logging;
mod models;
mod report;
mod server;
mod source;
mod trend;

use competency::{CompetencyDatabase, CompetencyProfile, ProfileOrigin, Scope};
use config::{Cli, Commands};
use models::Bias;
use source::HttpSummarySource;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(&cli.log_level);
    let mut rng = config::make_rng(cli.seed);

    match cli.command {
        Commands::Serve { port } => {
            let data = server::MockData::generate(&mut rng, cli.reference_year);
            tracing::info!(
                students = data.students.len(),
                eligible = data.overall.eligible_mhs,
                "mock dataset ready"
            );
            server::serve(data, port).await?;
        }
        Commands::Population {
            api_url,
            cohort,
            students,
            out,
        } => {
            let api = HttpSummarySource::new(api_url);
            let mut view = source::load_population(&api, &mut rng, cli.reference_year).await;

            if let Some(path) = students {
                let loaded = dataset::read_students(&path)?;
                tracing::info!(count = loaded.len(), path = %path.display(), "students loaded from file");
                view = view.with_students(loaded);
            }

            let report =
                report::build_population_report(&view, cohort, Utc::now().date_naive());
            match out {
                Some(out) => {
                    std::fs::write(&out, report)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                    println!("Report written to {}.", out.display());
                }
                None => print!("{report}"),
            }
        }
        Commands::Competency {
            batch,
            nrp,
            bias,
            variance,
            transcript,
            transcript_csv,
            json,
        } => {
            let db = CompetencyDatabase::build(rng.random());
            if let Some(year) = batch {
                if !db.batch_years().any(|known| known == year) {
                    tracing::warn!(cohort = year, "no batch profile, showing overall average");
                }
            }
            let (query, profile) = match (batch, nrp.as_deref(), bias) {
                (Some(year), _, _) => (year.to_string(), db.lookup(Scope::Batch(year))),
                (_, Some(nrp), _) => (nrp.to_string(), db.lookup(Scope::Individual(nrp))),
                (_, _, Some(bias)) => (
                    bias_label(bias).to_string(),
                    Some(CompetencyProfile {
                        title: format!("Simulated profile ({})", bias_label(bias)),
                        origin: ProfileOrigin::Synthetic,
                        scores: competency::generate_scores(&mut rng, bias, variance),
                    }),
                ),
                _ => ("all".to_string(), db.lookup(Scope::All)),
            };

            if let (Some(nrp), Some(profile)) = (nrp.as_deref(), profile.as_ref()) {
                if let Some(student) = db.known_student(nrp) {
                    tracing::debug!(cohort = student.cohort_year, "known student");
                } else if profile.origin == ProfileOrigin::Synthetic {
                    tracing::info!(%nrp, "unknown NRP, showing simulated profile");
                }
            }

            let want_transcript = transcript || transcript_csv.is_some();
            let entries = match &profile {
                Some(profile) if want_transcript => {
                    competency::transcript(&mut rng, &profile.scores)
                }
                _ => Vec::new(),
            };
            if let Some(path) = &transcript_csv {
                dataset::write_transcript(path, &query, &entries)?;
                tracing::info!(path = %path.display(), "transcript written");
            }

            if json {
                let payload = serde_json::json!({
                    "title": profile.as_ref().map(|p| p.title.as_str()),
                    "recommendation": profile.as_ref().and_then(|p| competency::recommendation(&p.scores)),
                    "scores": profile.as_ref().map(|p| &p.scores),
                    "transcript": entries,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print!(
                    "{}",
                    report::build_competency_report(&query, profile.as_ref(), &entries)
                );
            }
        }
        Commands::Generate {
            count,
            cohorts,
            out,
        } => {
            let students =
                generator::generate_students(&mut rng, count, &cohorts, cli.reference_year);
            dataset::write_students(&out, &students)?;
            let agg = eligibility::aggregate(&students);
            println!(
                "Wrote {} students ({} ready for TA) to {}.",
                agg.total,
                agg.eligible_count,
                out.display()
            );
        }
    }

    Ok(())
}

fn bias_label(bias: Bias) -> &'static str {
    match bias {
        Bias::Subject(subject) => subject.code(),
        Bias::AllGood => "ALL_GOOD",
        Bias::None => "NONE",
    }
}
