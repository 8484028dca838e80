use batch_runner::{RunEvent, RunReport};

pub struct OutputHandler {
    verbose: bool,
}

impl OutputHandler {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn print_event(&self, event: &RunEvent) {
        match event {
            RunEvent::Progress { percent, message } => println!("[{:5.1}%] {}", percent, message),
            RunEvent::Log(message) => println!("{}", message),
        }
    }

    pub fn print_cancel_requested(&self) {
        println!("Cancel requested, stopping after the current album...");
    }

    pub fn print_report(&self, report: &RunReport) {
        if report.canceled {
            println!("Run canceled after {} files", report.summary.total_files);
        }

        for path in &report.exported {
            println!("Exported: {}", path.display());
        }

        if self.verbose {
            for record in &report.errors {
                println!("  error: {} ({})", record.file, record.error);
            }
            for record in &report.not_found {
                println!("  not found: {} ({})", record.file, record.reason);
            }
        }
    }

    pub fn print_error(&self, error: &color_eyre::Report) {
        eprintln!("Error: {}", error);

        if self.verbose {
            eprintln!("\nError details:");
            error.chain().skip(1).for_each(|cause| {
                eprintln!("  caused by: {}", cause);
            });
        }
    }
}
