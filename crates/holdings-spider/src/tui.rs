use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress of a per-filing run: filings processed, rows collected, filings skipped.
pub(crate) struct FilingProgress {
    _multi: Option<MultiProgress>,
    pub(crate) total: ProgressBar,
    pub(crate) success: ProgressBar,
    pub(crate) fails: ProgressBar,
}

impl FilingProgress {
    /// Visible bars when `tui` is set, hidden otherwise.
    pub(crate) fn new(len: usize, tui: bool) -> Self {
        if tui {
            if let Ok(progress) = multi_progress(len) {
                return progress;
            }
        }
        Self {
            _multi: None,
            total: ProgressBar::hidden(),
            success: ProgressBar::hidden(),
            fails: ProgressBar::hidden(),
        }
    }

    pub(crate) fn finish(&self) {
        self.total.finish_and_clear();
        self.success.finish_and_clear();
        self.fails.finish_and_clear();
    }
}

fn multi_progress(len: usize) -> anyhow::Result<FilingProgress> {
    // overall multi progress bar
    let multi = MultiProgress::new();

    // total number of filings to collect
    let total = multi.add(
        ProgressBar::new(len as u64).with_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.magenta}\n \
                        {msg:>9.white} |{bar:57.white/grey}| {pos:<2} / {human_len} \
                        ({percent_precise}%) [Time: {elapsed}, Rate: {per_sec}, ETA: {eta}]",
                )?
                .progress_chars("## "),
        ),
    );
    total.set_message("filings");
    total.enable_steady_tick(Duration::from_millis(100));

    // filings yielding a watchlist row
    let success = multi.insert_after(
        &total,
        ProgressBar::new(len as u64).with_style(
            ProgressStyle::default_bar()
                .template(" {msg:>9.green} |{bar:57.green}| {pos:<2.green}")?
                .progress_chars("## "),
        ),
    );
    success.set_message("rows");

    // filings skipped on error
    let fails = multi.insert_after(
        &success,
        ProgressBar::new(len as u64).with_style(
            ProgressStyle::default_bar()
                .template(" {msg:>9.red} |{bar:57.red}| {pos:<2.red}")?
                .progress_chars("## "),
        ),
    );
    fails.set_message("skipped");

    Ok(FilingProgress {
        _multi: Some(multi),
        total,
        success,
        fails,
    })
}
