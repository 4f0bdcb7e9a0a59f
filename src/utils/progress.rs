use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::io;
use tracing_subscriber::fmt::MakeWriter;

/// Log writer that suspends the progress bars while a line is written.
#[derive(Clone)]
pub struct IndicatifWriter {
    progress_bars: MultiProgress,
}

impl IndicatifWriter {
    pub fn new(pb: MultiProgress) -> Self {
        Self { progress_bars: pb }
    }
}

impl io::Write for IndicatifWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.progress_bars.suspend(|| io::stderr().write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.progress_bars.suspend(|| io::stderr().flush())
    }
}

impl<'a> MakeWriter<'a> for IndicatifWriter {
    type Writer = IndicatifWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Add a bar for one category batch.
pub fn batch_bar(progress: &MultiProgress, len: usize, label: &str) -> ProgressBar {
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} {prefix:>9} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");

    let pb = progress.add(ProgressBar::new(len as u64));
    pb.set_style(style);
    pb.set_prefix(label.to_string());
    pb
}
