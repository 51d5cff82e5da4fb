use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::generator::DEFAULT_REFERENCE_YEAR;
use crate::models::{Bias, CompetencySubject};
use crate::server::DEFAULT_PORT;
use crate::source::DEFAULT_API_URL;

#[derive(Parser)]
#[command(name = "its-academic-dashboard")]
#[command(about = "Population and competency analytics for the ITS academic dashboard", long_about = None)]
pub struct Cli {
    /// Seed for every synthetic dataset; omit for fresh data on each run
    #[arg(long, global = true, env = "DASHBOARD_SEED")]
    pub seed: Option<u64>,
    /// Year the credit trajectory of synthetic students is measured against
    #[arg(long, global = true, default_value_t = DEFAULT_REFERENCE_YEAR)]
    pub reference_year: i32,
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the mock API server
    Serve {
        #[arg(long, env = "MOCK_PORT", default_value_t = DEFAULT_PORT)]
        port: u16,
    },
    /// Build the population / TA eligibility report
    Population {
        #[arg(long, env = "DASHBOARD_API_URL", default_value = DEFAULT_API_URL)]
        api_url: String,
        /// Restrict figures to one cohort year
        #[arg(long)]
        cohort: Option<i32>,
        /// Read students from a CSV file instead of synthesising them
        #[arg(long)]
        students: Option<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show a competency radar profile
    #[command(group(
        ArgGroup::new("scope")
            .args(["batch", "nrp", "bias"])
            .multiple(false)
    ))]
    Competency {
        #[arg(long)]
        batch: Option<i32>,
        #[arg(long)]
        nrp: Option<String>,
        /// Generate an ad-hoc profile leaning towards a subject code or ALL_GOOD
        #[arg(long, value_parser = parse_bias)]
        bias: Option<Bias>,
        #[arg(long, default_value_t = 10.0)]
        variance: f64,
        /// Also derive letter grades per subject
        #[arg(long)]
        transcript: bool,
        /// Write the derived grades to a CSV file
        #[arg(long)]
        transcript_csv: Option<PathBuf>,
        /// Print the radar payload as JSON instead of Markdown
        #[arg(long)]
        json: bool,
    },
    /// Write a synthetic student dataset as CSV
    Generate {
        #[arg(long, default_value_t = 200)]
        count: usize,
        #[arg(long, value_delimiter = ',', default_values_t = [2020, 2021, 2022, 2023])]
        cohorts: Vec<i32>,
        #[arg(long, default_value = "students.csv")]
        out: PathBuf,
    },
}

pub fn parse_bias(value: &str) -> Result<Bias, String> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("ALL_GOOD") {
        return Ok(Bias::AllGood);
    }
    if value.eq_ignore_ascii_case("NONE") {
        return Ok(Bias::None);
    }
    CompetencySubject::from_code(value)
        .map(Bias::Subject)
        .ok_or_else(|| format!("unknown subject code: {value}"))
}

pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bias_codes_parse() {
        assert_eq!(parse_bias("netics"), Ok(Bias::Subject(CompetencySubject::Netics)));
        assert_eq!(parse_bias(" ALPRO "), Ok(Bias::Subject(CompetencySubject::Alpro)));
        assert_eq!(parse_bias("all_good"), Ok(Bias::AllGood));
        assert!(parse_bias("NCC").is_err());
    }

    #[test]
    fn competency_scope_is_exclusive() {
        let result = Cli::try_parse_from([
            "its-academic-dashboard",
            "competency",
            "--batch",
            "2021",
            "--nrp",
            "5025211001",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn global_seed_reaches_subcommands() {
        let cli = Cli::try_parse_from(["its-academic-dashboard", "generate", "--seed", "7"]).unwrap();
        assert_eq!(cli.seed, Some(7));
        match cli.command {
            Commands::Generate { count, cohorts, .. } => {
                assert_eq!(count, 200);
                assert_eq!(cohorts, vec![2020, 2021, 2022, 2023]);
            }
            _ => panic!("expected generate"),
        }
    }
}
