use whiteout::pipeline::LogoOutcome;

#[derive(Debug, Default)]
pub(crate) struct ProcessingStats {
    pub(crate) total_files: usize,
    pub(crate) processed: usize,
    pub(crate) failed: usize,
    pub(crate) cleaned: usize,
    pub(crate) removed_pixels: usize,
}

impl ProcessingStats {
    pub(crate) fn new(total_files: usize) -> Self {
        Self {
            total_files,
            ..Default::default()
        }
    }

    pub(crate) fn record(&mut self, outcome: &LogoOutcome) {
        self.processed += 1;
        if let Some(report) = &outcome.report {
            self.cleaned += 1;
            self.removed_pixels += report.removed();
        }
    }

    pub(crate) fn print_progress(&self) {
        println!(
            "Progress: {}/{} files processed, {} failed, {} backgrounds removed",
            self.processed + self.failed,
            self.total_files,
            self.failed,
            self.cleaned
        );
    }

    pub(crate) fn print_summary(&self) {
        println!("\n=== Processing Summary ===");
        println!("Total files: {}", self.total_files);
        println!("Successfully processed: {}", self.processed);
        println!("Failed: {}", self.failed);
        println!("Backgrounds removed: {}", self.cleaned);
        println!("Pixels made transparent: {}", self.removed_pixels);
        if self.total_files > 0 {
            println!("Success rate: {:.1}%",
                     (self.processed as f64 / self.total_files as f64) * 100.0);
        }
    }
}
