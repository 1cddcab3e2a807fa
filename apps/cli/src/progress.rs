//! Terminal progress for batch downloads.

use indicatif::{ProgressBar, ProgressStyle};
use ligbench_rcsb::{DownloadProgress, DownloadResult, DownloadSummary};

/// indicatif bar that also prints one status line per entry.
pub(crate) struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    pub(crate) fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        Self { bar }
    }
}

impl DownloadProgress for CliProgress {
    fn start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.enable_steady_tick(std::time::Duration::from_millis(80));
    }

    fn item(&self, result: &DownloadResult) {
        let name = format!("{}.{}", result.pdb_id, result.format);
        if result.ok {
            self.bar
                .println(format!("OK  {name} -> {}", result.path.display()));
        } else {
            let status = result
                .status_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".into());
            let error = result.error.as_deref().unwrap_or("unknown error");
            self.bar.println(format!("ERR {name} ({status}) {error}"));
        }
        self.bar.set_message(name);
        self.bar.inc(1);
    }

    fn done(&self, _summary: &DownloadSummary) {
        self.bar.finish_and_clear();
    }
}
