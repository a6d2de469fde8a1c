use std::time::Instant;

/// rate-limited textual progress, at most one update per wall second plus a
/// final unconditional update at end-of-pass
pub struct Progress {
    last: Instant,
}

impl Progress {
    /// creates a printer and emits the initial `0%` line, mirroring the
    /// source's `print_progress` call before the pass loop begins
    pub fn start(current: u64, size: u64) -> Self {
        let printer = Self {
            last: Instant::now(),
        };
        printer.print(current, size);
        printer
    }

    /// unconditionally renders the current progress line
    pub fn print(&self, current: u64, size: u64) {
        let pct = if size == 0 { 0 } else { (100 * current) / size };
        print!("\r...{pct:>4}% / {current:>20} of{size:>20} bytes");
        let _ = std::io::Write::flush(&mut std::io::stdout());
    }

    /// renders the progress line only if at least one wall-clock second has
    /// elapsed since the last render
    pub fn maybe_print(&mut self, current: u64, size: u64) {
        if self.last.elapsed().as_secs() >= 1 {
            self.print(current, size);
            self.last = Instant::now();
        }
    }

    /// final, unconditional render, called once the pass has scanned `size`
    pub fn finish(&self, size: u64) {
        self.print(size, size);
        println!();
    }
}
