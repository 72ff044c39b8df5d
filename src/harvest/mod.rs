//! The sequential harvest loop.
//!
//! Listings are fetched one after another, candidates are processed in
//! discovery order, and every per-candidate failure becomes a counted skip.

pub mod errors;
pub mod stats;

pub use errors::{ErrorKind, HarvestError};
pub use stats::RunStatistics;

use crate::config::{HarvestConfig, HarvestScope, VenueSpec};
use crate::extractor::TextExtractor;
use crate::fetcher::{FetchError, Fetcher};
use crate::filter::{FilterOutcome, KeywordFilter, MatchScope};
use crate::sources::{CandidateLink, Listing, PaperSource, build_source};
use crate::storage::{OutputTable, Persister, Placement, StorageError, naming};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{Instrument, debug, info, info_span, warn};

/// Where results go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestOptions {
    pub save_dir: PathBuf,
    /// Metadata table; only structured sources produce rows.
    pub output: Option<PathBuf>,
    pub download_pdfs: bool,
}

/// Everything needed to start a run, resolved from the command line.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub venue: VenueSpec,
    pub scope: HarvestScope,
    pub config: HarvestConfig,
    pub filter: KeywordFilter,
    pub options: HarvestOptions,
}

pub struct Harvester {
    source: Box<dyn PaperSource>,
    fetcher: Fetcher,
    extractor: TextExtractor,
    filter: KeywordFilter,
    persister: Persister,
    options: HarvestOptions,
    stats: RunStatistics,
}

impl Harvester {
    pub fn new(
        source: Box<dyn PaperSource>,
        fetcher: Fetcher,
        extractor: TextExtractor,
        filter: KeywordFilter,
        options: HarvestOptions,
    ) -> Self {
        let persister = Persister::new(source.persist_mode());
        Self {
            source,
            fetcher,
            extractor,
            filter,
            persister,
            options,
            stats: RunStatistics::default(),
        }
    }

    /// Wire up the source, a fetcher paced for it and the PDF extractor.
    pub fn from_plan(plan: &RunPlan) -> Result<Self, FetchError> {
        let source = build_source(&plan.venue, &plan.config.endpoints);
        let delay = source.politeness_delay(&plan.config);
        let fetcher = Fetcher::new(&plan.config, delay)?;
        let extractor = TextExtractor::with_lopdf(plan.config.min_pages, plan.config.window_pages);

        Ok(Self::new(
            source,
            fetcher,
            extractor,
            plan.filter.clone(),
            plan.options.clone(),
        ))
    }

    pub fn stats(&self) -> &RunStatistics {
        &self.stats
    }

    /// Harvest every listing in `scope`. Only failing to create the output
    /// table aborts the run.
    pub async fn run(&mut self, scope: &HarvestScope) -> Result<RunStatistics, StorageError> {
        self.stats = RunStatistics::default();

        let mut table = match &self.options.output {
            Some(path) => Some(OutputTable::create(path)?),
            None => None,
        };

        let listings = self.source.listings(scope);
        info!(
            venue = %self.source.venue().id,
            listings = listings.len(),
            "starting harvest"
        );

        for listing in &listings {
            let span = info_span!("listing", context = %listing.context);
            self.harvest_listing(listing, table.as_mut())
                .instrument(span)
                .await;
        }

        info!(
            total = self.stats.total,
            filtered = self.stats.filtered,
            downloaded = self.stats.downloaded,
            skipped = self.stats.total_skipped(),
            "harvest finished"
        );
        Ok(self.stats.clone())
    }

    async fn harvest_listing(&mut self, listing: &Listing, mut table: Option<&mut OutputTable>) {
        let page = match self.fetcher.fetch_page(&listing.url).await {
            Ok(page) => page,
            Err(err) => {
                warn!(url = %listing.url, "listing unavailable: {}", err);
                self.stats.listings_failed += 1;
                return;
            }
        };

        let candidates = self.source.discover(listing, &page);
        info!(
            url = %listing.url,
            candidates = candidates.len(),
            "processing papers from {} {}",
            self.source.venue().display_name,
            listing.context.year
        );

        for candidate in candidates {
            let reference = candidate.url.clone();
            // Abstract matching happens before any download, so it runs the
            // metadata pipeline.
            let result = match self.source.match_scope() {
                MatchScope::DocumentText => self.process_document(candidate).await,
                MatchScope::Abstract => {
                    self.process_record(candidate, table.as_deref_mut()).await
                }
            };

            if let Err(err) = result {
                warn!(url = %reference, kind = %err.kind(), "skipping: {}", err);
                self.stats.record_skip(err.kind());
            }
        }
    }

    /// resolve, fetch, extract, filter on the text window, persist
    async fn process_document(&mut self, candidate: CandidateLink) -> Result<(), HarvestError> {
        let document = self.source.resolve(candidate, &self.fetcher).await?;

        let fetched = match self.fetcher.fetch_bytes(&document.url).await {
            Ok(fetched) => fetched,
            Err(err) => {
                self.stats.failed += 1;
                return Err(err.into());
            }
        };

        let content = self.extractor.extract(fetched.body)?;
        self.stats.total += 1;

        match self.filter.check(&content.text_window) {
            FilterOutcome::Rejected => {
                debug!(url = %document.url, "no keyword match");
                return Ok(());
            }
            FilterOutcome::Matched(term) => {
                debug!(url = %document.url, term = %term, "keyword match");
            }
            FilterOutcome::Unfiltered => {}
        }
        self.stats.filtered += 1;

        let dir = self
            .source
            .destination(&self.options.save_dir, &document.candidate.context);
        let file_name = naming::pdf_file_name(&self.source.document_stem(&document, Some(&content)));
        let persisted = self.persister.write(&dir, &file_name, &content.bytes).await?;

        if persisted.written {
            self.stats.downloaded += 1;
            info!(path = %persisted.path.display(), pages = content.page_count, "saved document");
        }
        Ok(())
    }

    /// filter on the abstract, optionally download, then always write the row
    async fn process_record(
        &mut self,
        candidate: CandidateLink,
        table: Option<&mut OutputTable>,
    ) -> Result<(), HarvestError> {
        let Some(mut record) = candidate.record.clone() else {
            return Err(HarvestError::ResolutionFailed {
                url: candidate.url,
                reason: "listing entry carries no metadata".to_string(),
            });
        };
        self.stats.total += 1;

        let abstract_text = record.abstract_text.as_deref().unwrap_or_default();
        if !self.filter.check(abstract_text).is_match() {
            debug!(title = %record.title, "abstract does not match");
            return Ok(());
        }
        self.stats.filtered += 1;
        debug!(title = %record.title, "processing paper");

        let mut skip = None;
        if self.options.download_pdfs {
            match self.download_record(candidate).await {
                Ok(path) => record.local_path = Some(path),
                Err(err) => skip = Some(err),
            }
        }

        let appended = match table {
            Some(table) => table.append(&record),
            None => Ok(()),
        };
        self.settle_record(&record.title, skip, appended)
    }

    /// A row that cannot be written wins over a failed download, but the
    /// download failure is still logged and counted.
    fn settle_record(
        &mut self,
        title: &str,
        skip: Option<HarvestError>,
        appended: Result<(), StorageError>,
    ) -> Result<(), HarvestError> {
        match (skip, appended) {
            (skip, Err(err)) => {
                if let Some(download_err) = skip {
                    warn!(title = %title, kind = %download_err.kind(), "skipping: {}", download_err);
                    self.stats.record_skip(download_err.kind());
                }
                Err(err.into())
            }
            (Some(download_err), Ok(())) => Err(download_err),
            (None, Ok(())) => Ok(()),
        }
    }

    async fn download_record(&mut self, candidate: CandidateLink) -> Result<PathBuf, HarvestError> {
        let document = self.source.resolve(candidate, &self.fetcher).await?;
        let dir = self
            .source
            .destination(&self.options.save_dir, &document.candidate.context);
        let file_name = naming::pdf_file_name(&self.source.document_stem(&document, None));

        match self.persister.place(&dir, &file_name).await? {
            Placement::Existing(path) => {
                info!(path = %path.display(), "already downloaded");
                Ok(path)
            }
            Placement::Fresh(path) => match self.fetcher.download_to(&document.url, &path).await {
                Ok(bytes) => {
                    self.stats.downloaded += 1;
                    info!(path = %path.display(), bytes, "saved document");
                    Ok(path)
                }
                Err(err) => {
                    self.stats.failed += 1;
                    Err(err.into())
                }
            },
        }
    }

    /// End-of-run report for stdout.
    pub fn summary(&self) -> String {
        let stats = &self.stats;
        let mut out = String::from("\nSummary:\n");
        let _ = writeln!(out, "- Total papers found: {}", stats.total);

        if !self.filter.is_empty() {
            let terms = self.filter.terms().collect::<Vec<_>>().join(", ");
            let _ = writeln!(out, "- Papers matching keywords ({terms}): {}", stats.filtered);
        }

        if self.options.download_pdfs {
            let _ = writeln!(out, "- Successfully downloaded PDFs: {}", stats.downloaded);
            let _ = writeln!(out, "- Failed PDF downloads: {}", stats.failed);
        }

        if stats.listings_failed > 0 {
            let _ = writeln!(out, "- Listings unavailable: {}", stats.listings_failed);
        }

        for (kind, count) in &stats.skipped {
            let _ = writeln!(out, "- Skipped ({kind}): {count}");
        }

        if let Some(output) = &self.options.output {
            let _ = writeln!(out, "- Papers information saved to: {}", absolute(output).display());
        }
        if self.options.download_pdfs {
            let _ = writeln!(
                out,
                "- PDFs saved to: {}",
                absolute(&self.options.save_dir).display()
            );
        }
        out
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Endpoints, SourceFamily};
    use std::time::Duration;

    fn harvester(filter: KeywordFilter, output: Option<PathBuf>, download_pdfs: bool) -> Harvester {
        let venue = VenueSpec::new("usenix", "USENIX Security", SourceFamily::StructuredArticle);
        let config = HarvestConfig::default();
        Harvester::new(
            build_source(&venue, &Endpoints::default()),
            Fetcher::new(&config, Duration::ZERO).unwrap(),
            TextExtractor::with_lopdf(6, 3),
            filter,
            HarvestOptions {
                save_dir: PathBuf::from("paper/usenix_security"),
                output,
                download_pdfs,
            },
        )
    }

    fn write_error() -> StorageError {
        StorageError::Write {
            path: PathBuf::from("papers.csv"),
            source: std::io::Error::other("disk full"),
        }
    }

    #[test]
    fn failed_row_keeps_the_download_failure_counted() {
        let mut harvester = harvester(KeywordFilter::none(), None, true);
        let download = HarvestError::from(FetchError::http(reqwest::StatusCode::BAD_GATEWAY));

        let result = harvester.settle_record("Fuzzing the Kernel", Some(download), Err(write_error()));

        assert_eq!(result.unwrap_err().kind(), ErrorKind::Filesystem);
        assert_eq!(harvester.stats.skipped(ErrorKind::Transport), 1);
    }

    #[test]
    fn download_failure_is_returned_when_the_row_is_written() {
        let mut harvester = harvester(KeywordFilter::none(), None, true);
        let download = HarvestError::ResolutionFailed {
            url: "https://www.usenix.org/x".into(),
            reason: "no PDF link available".into(),
        };

        let result = harvester.settle_record("Side Channels", Some(download), Ok(()));
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Resolution);
        assert_eq!(harvester.stats.total_skipped(), 0);

        assert!(harvester.settle_record("Side Channels", None, Ok(())).is_ok());
        assert!(
            harvester
                .settle_record("Side Channels", None, Err(write_error()))
                .is_err()
        );
        assert_eq!(harvester.stats.total_skipped(), 0);
    }

    #[test]
    fn summary_lists_only_relevant_lines() {
        let mut harvester = harvester(KeywordFilter::none(), None, false);
        harvester.stats.total = 4;
        harvester.stats.filtered = 4;

        let summary = harvester.summary();
        assert!(summary.contains("- Total papers found: 4"));
        assert!(!summary.contains("matching keywords"));
        assert!(!summary.contains("downloaded PDFs"));
        assert!(!summary.contains("saved to"));
    }

    #[test]
    fn summary_reports_keywords_downloads_and_skips() {
        let mut harvester = harvester(
            KeywordFilter::new(["fuzzing", "kernel"]),
            Some(PathBuf::from("out/papers.csv")),
            true,
        );
        harvester.stats.total = 10;
        harvester.stats.filtered = 3;
        harvester.stats.downloaded = 2;
        harvester.stats.failed = 1;
        harvester.stats.record_skip(ErrorKind::Resolution);

        let summary = harvester.summary();
        assert!(summary.starts_with("\nSummary:\n"));
        assert!(summary.contains("- Papers matching keywords (fuzzing, kernel): 3"));
        assert!(summary.contains("- Successfully downloaded PDFs: 2"));
        assert!(summary.contains("- Failed PDF downloads: 1"));
        assert!(summary.contains("- Skipped (resolution failed): 1"));
        assert!(summary.contains("out/papers.csv"));
        assert!(summary.contains("paper/usenix_security"));
    }
}
