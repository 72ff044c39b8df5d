use crate::config::{ConfigError, HarvestConfig, HarvestScope, SourceFamily, VenueRegistry};
use crate::filter::KeywordFilter;
use crate::harvest::{HarvestOptions, RunPlan};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_SAVE_DIR: &str = "paper";
const DEFAULT_STRUCTURED_SAVE_DIR: &str = "paper/usenix_security";

#[derive(Parser, Debug)]
#[command(name = "harvest")]
#[command(about = "Harvest security conference papers and filter them by keyword")]
#[command(version)]
pub struct Cli {
    /// Venue to harvest (ccs, sp, usenix)
    #[arg(short = 'C', long)]
    pub venue: String,

    /// Years to harvest; required for dblp venues
    #[arg(short = 'Y', long, num_args = 1..)]
    pub years: Vec<String>,

    /// Keyword terms, matched case-insensitively in order
    #[arg(short = 'K', long, num_args = 1..)]
    pub keywords: Vec<String>,

    /// Directory documents are saved under
    #[arg(short = 'F', long)]
    pub save_dir: Option<PathBuf>,

    /// Metadata table (usenix only)
    #[arg(short = 'o', long, default_value = "usenix_security_papers.csv")]
    pub output: PathBuf,

    /// Submission terms (usenix only)
    #[arg(short = 't', long, num_args = 1..)]
    pub terms: Vec<String>,

    /// Download PDFs (usenix only; other venues always download)
    #[arg(long)]
    pub pdf: bool,

    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, env = "HARVEST_JSON_LOGS")]
    pub json_logs: bool,

    /// Override the politeness delay between requests
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Documents with this many pages or fewer are skipped
    #[arg(long)]
    pub min_pages: Option<usize>,

    /// Leading pages searched for keywords
    #[arg(long)]
    pub window_pages: Option<usize>,

    /// Retries for transient transport failures
    #[arg(long)]
    pub max_retries: Option<u32>,
}

impl Cli {
    /// Resolve the arguments against the registry and base configuration.
    /// Everything that can be wrong with the invocation is caught here.
    pub fn plan(
        &self,
        registry: &VenueRegistry,
        mut config: HarvestConfig,
    ) -> Result<RunPlan, ConfigError> {
        let venue = registry.lookup(&self.venue)?.clone();
        let scope = HarvestScope::for_venue(&venue, self.years.clone(), self.terms.clone())?;

        if let Some(delay_ms) = self.delay_ms {
            let delay = Duration::from_millis(delay_ms);
            config.document_delay = delay;
            config.metadata_delay = delay;
        }
        if let Some(min_pages) = self.min_pages {
            config.min_pages = min_pages;
        }
        if let Some(window_pages) = self.window_pages {
            config.window_pages = window_pages;
        }
        if let Some(max_retries) = self.max_retries {
            config.max_retries = max_retries;
        }
        config.validate()?;

        let structured = venue.family == SourceFamily::StructuredArticle;
        let save_dir = self.save_dir.clone().unwrap_or_else(|| {
            PathBuf::from(if structured {
                DEFAULT_STRUCTURED_SAVE_DIR
            } else {
                DEFAULT_SAVE_DIR
            })
        });

        Ok(RunPlan {
            venue,
            scope,
            config,
            filter: KeywordFilter::new(&self.keywords),
            options: HarvestOptions {
                save_dir,
                output: structured.then(|| self.output.clone()),
                download_pdfs: !structured || self.pdf,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(args: &[&str]) -> Result<RunPlan, ConfigError> {
        let cli = Cli::try_parse_from(args).unwrap();
        cli.plan(&VenueRegistry::builtin(), HarvestConfig::default())
    }

    #[test]
    fn dblp_venue_with_keywords() {
        let plan = plan(&["harvest", "-C", "ccs", "-Y", "2022", "2023", "-K", "fuzzing", "llm"]).unwrap();

        assert_eq!(plan.venue.id, "ccs");
        assert_eq!(plan.scope.years, vec!["2022", "2023"]);
        assert!(plan.scope.terms.is_empty());
        assert_eq!(plan.filter.terms().collect::<Vec<_>>(), vec!["fuzzing", "llm"]);
        assert_eq!(plan.options.save_dir, PathBuf::from("paper"));
        assert_eq!(plan.options.output, None);
        assert!(plan.options.download_pdfs);
    }

    #[test]
    fn dblp_venue_requires_years() {
        assert!(matches!(
            plan(&["harvest", "-C", "sp"]),
            Err(ConfigError::MissingScope("year"))
        ));
    }

    #[test]
    fn unknown_venue_is_rejected() {
        assert!(matches!(
            plan(&["harvest", "-C", "ndss", "-Y", "2022"]),
            Err(ConfigError::UnsupportedVenue { .. })
        ));
    }

    #[test]
    fn structured_venue_defaults() {
        let plan = plan(&["harvest", "-C", "usenix"]).unwrap();

        assert_eq!(plan.scope.years.len(), 6);
        assert_eq!(plan.scope.terms.len(), 6);
        assert_eq!(plan.options.save_dir, PathBuf::from("paper/usenix_security"));
        assert_eq!(
            plan.options.output,
            Some(PathBuf::from("usenix_security_papers.csv"))
        );
        assert!(!plan.options.download_pdfs);
    }

    #[test]
    fn overrides_reach_the_config() {
        let plan = plan(&[
            "harvest",
            "-C",
            "usenix",
            "--pdf",
            "-Y",
            "24",
            "-t",
            "cycle1",
            "-F",
            "out",
            "--delay-ms",
            "0",
            "--min-pages",
            "2",
            "--window-pages",
            "1",
            "--max-retries",
            "3",
        ])
        .unwrap();

        assert!(plan.options.download_pdfs);
        assert_eq!(plan.scope.terms, vec!["cycle1"]);
        assert_eq!(plan.options.save_dir, PathBuf::from("out"));
        assert_eq!(plan.config.metadata_delay, Duration::ZERO);
        assert_eq!(plan.config.document_delay, Duration::ZERO);
        assert_eq!(plan.config.min_pages, 2);
        assert_eq!(plan.config.window_pages, 1);
        assert_eq!(plan.config.max_retries, 3);
    }

    #[test]
    fn zero_window_is_invalid() {
        assert!(matches!(
            plan(&["harvest", "-C", "ccs", "-Y", "2022", "--window-pages", "0"]),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
