use std::{
    fmt::{self, Debug},
    future::Future,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Datelike, Local, TimeZone};
use serde::{Serialize, de::DeserializeOwned};

use crate::{Aggregate, AggregateStats, error::ReportError, summary::Summary};

/// A [`Report`] is the processed form of an [`Aggregate`].
///
/// Reports are pure data derived from an aggregate, usually through
/// [`From<A>`]. They carry no I/O; a [`Reporter`] decides where they go.
pub trait Report<A>
where
    Self: Send + Sync + Debug + From<A> + Serialize + DeserializeOwned,
    A: Aggregate,
{
}

/// A [`Reporter`] takes a [`Report`] somewhere: the terminal, a file, a
/// service.
pub trait Reporter<A: Aggregate, R: Report<A>> {
    fn report(&self, report: &R) -> impl Future<Output = Result<(), ReportError>>;
}

/// The human-readable run summary shared by the console and the general
/// report file.
impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "-------------- Test Statistics ---------------")?;
        writeln!(
            f,
            "Server type:             {}",
            self.server_type.as_deref().unwrap_or("unknown")
        )?;
        writeln!(f, "Total requests run:      {}", self.attempted)?;
        writeln!(f, "Total pass:              {}", self.passed)?;
        writeln!(f, "Total fail:              {}", self.failed)?;
        writeln!(f, "Status codes:")?;
        for (bucket, count) in &self.histogram {
            writeln!(f, "  {bucket:<18} {count}")?;
        }
        writeln!(
            f,
            "Bytes downloaded:        {} ({:.2} KB)",
            self.bytes_downloaded,
            self.kilobytes_downloaded()
        )?;
        writeln!(f, "Shortest time:           {} ms", self.min)?;
        writeln!(f, "Median time:             {} ms", self.median)?;
        writeln!(f, "Mean time:               {} ms", self.mean)?;
        writeln!(f, "Longest time:            {} ms", self.max)
    }
}

pub fn render_general(summary: &Summary) -> String {
    summary.to_string()
}

/// `URL,Hits` CSV, one row per target.
pub fn render_url_hits(summary: &Summary) -> String {
    let rows: String = summary
        .url_hits
        .iter()
        .map(|(url, hits)| format!("{url},{hits}\n"))
        .collect();
    format!("URL,Hits\n{rows}")
}

/// Every recorded latency, comma-joined, in recording order.
pub fn render_times(summary: &Summary) -> String {
    let times: Vec<String> = summary.latencies.iter().map(u64::to_string).collect();
    times.join(",")
}

/// Prints the run summary to stdout.
pub struct ConsoleReporter;

impl Reporter<AggregateStats, Summary> for ConsoleReporter {
    async fn report(&self, report: &Summary) -> Result<(), ReportError> {
        print!("{}", render_general(report));
        Ok(())
    }
}

/// Prints the run summary as pretty JSON to stdout.
pub struct JsonReporter;

impl Reporter<AggregateStats, Summary> for JsonReporter {
    async fn report(&self, report: &Summary) -> Result<(), ReportError> {
        println!("{}", serde_json::to_string_pretty(report)?);
        Ok(())
    }
}

/// The three files written per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    General,
    UrlHit,
    Time,
}

impl ReportKind {
    pub const ALL: [ReportKind; 3] = [ReportKind::General, ReportKind::UrlHit, ReportKind::Time];

    pub fn label(&self) -> &'static str {
        match self {
            ReportKind::General => "general",
            ReportKind::UrlHit => "url_hit",
            ReportKind::Time => "time",
        }
    }

    fn render(&self, summary: &Summary) -> String {
        match self {
            ReportKind::General => render_general(summary),
            ReportKind::UrlHit => render_url_hits(summary),
            ReportKind::Time => render_times(summary),
        }
    }
}

/// `{prefix}_{kind}_report_{YYYY}{MM}{DD}_{unix-timestamp}.txt`
pub fn report_file_name<Tz: TimeZone>(prefix: &str, kind: ReportKind, at: &DateTime<Tz>) -> String {
    format!(
        "{prefix}_{}_report_{:04}{:02}{:02}_{}.txt",
        kind.label(),
        at.year(),
        at.month(),
        at.day(),
        at.timestamp()
    )
}

/// Persists the general, url-hit and time reports of a run into a directory.
///
/// Any write failure is returned; a run without its reports is lost.
#[derive(Debug, Clone)]
pub struct FileReporter {
    pub dir: PathBuf,
    pub prefix: String,
}

impl FileReporter {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    /// Writes the three reports stamped with `at`, returning their paths.
    pub async fn write_all<Tz: TimeZone>(
        &self,
        summary: &Summary,
        at: &DateTime<Tz>,
    ) -> Result<Vec<PathBuf>, ReportError> {
        let mut written = Vec::with_capacity(ReportKind::ALL.len());
        for kind in ReportKind::ALL {
            let path = self.dir.join(report_file_name(&self.prefix, kind, at));
            write_file(&path, kind.render(summary)).await?;
            tracing::info!("Wrote {} report to {}", kind.label(), path.display());
            written.push(path);
        }
        Ok(written)
    }
}

async fn write_file(path: &Path, contents: String) -> Result<(), ReportError> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|source| ReportError::Write {
            path: path.to_path_buf(),
            source,
        })
}

impl Reporter<AggregateStats, Summary> for FileReporter {
    async fn report(&self, report: &Summary) -> Result<(), ReportError> {
        self.write_all(report, &Local::now()).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::RequestOutcome;

    fn sample() -> Summary {
        let mut stats = AggregateStats::new();
        stats.aggregate(&[
            RequestOutcome::passed("http://a", 12, 2048, Some("nginx".into())),
            RequestOutcome::rejected("http://b", 503),
            RequestOutcome::passed("http://a", 8, 1024, None),
        ]);
        Summary::from(stats)
    }

    #[test]
    fn file_names_follow_the_pattern() {
        let at = Utc.with_ymd_and_hms(2026, 3, 7, 12, 0, 0).unwrap();
        assert_eq!(
            report_file_name("run", ReportKind::General, &at),
            format!("run_general_report_20260307_{}.txt", at.timestamp())
        );
        assert_eq!(
            report_file_name("run", ReportKind::UrlHit, &at),
            format!("run_url_hit_report_20260307_{}.txt", at.timestamp())
        );
    }

    #[test]
    fn general_report_lists_counters() {
        let text = render_general(&sample());
        assert!(text.contains("Server type:             nginx"));
        assert!(text.contains("Total requests run:      3"));
        assert!(text.contains("Total pass:              2"));
        assert!(text.contains("Total fail:              1"));
        assert!(text.contains("  5xx                1\n"));
        assert!(text.ends_with("Longest time:            12 ms\n"));
        assert!(text.contains("Bytes downloaded:        3072 (3.00 KB)"));
        assert!(text.contains("Median time:             8 ms"));
    }

    #[test]
    fn url_hits_csv() {
        assert_eq!(render_url_hits(&sample()), "URL,Hits\nhttp://a,2\nhttp://b,1\n");
    }

    #[test]
    fn times_keep_recording_order() {
        assert_eq!(render_times(&sample()), "12,0,8");
    }

    #[tokio::test]
    async fn writes_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = FileReporter::new(dir.path(), "bench");
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap();

        let written = reporter.write_all(&sample(), &at).await.unwrap();
        assert_eq!(written.len(), 3);
        let times = tokio::fs::read_to_string(&written[2]).await.unwrap();
        assert_eq!(times, "12,0,8");
    }

    #[tokio::test]
    async fn unwritable_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = FileReporter::new(dir.path().join("missing"), "bench");
        let err = reporter.write_all(&sample(), &Utc::now()).await.unwrap_err();
        assert!(matches!(err, ReportError::Write { .. }));
    }
}
