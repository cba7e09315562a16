use shared::{ConvertSummary, DbfSummary};

/// Console status lines for the command line tool
pub struct Interface {
    verbose: bool,
}

impl Interface {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Display a message if verbose mode is enabled
    pub fn display(&self, message: &str) {
        if self.verbose {
            println!("{}", message);
        }
    }

    pub fn status(&self, operation: &str, status: &str) {
        self.display(&format!("📋 {}: {}", operation, status));
    }

    /// Errors are always shown, on stderr
    pub fn error(&self, operation: &str, error: &anyhow::Error) {
        eprintln!("❌ {}: {:#}", operation, error);
    }

    pub fn success(&self, operation: &str, details: Option<&str>) {
        match details {
            Some(details) => self.display(&format!("✅ {}: {}", operation, details)),
            None => self.display(&format!("✅ {}", operation)),
        }
    }

    pub fn export_convert_summary(&self, summary: &ConvertSummary) {
        if summary.header_written {
            self.status("Header", "created destination with header line");
        }
        self.success("Conversion", Some(&summary.message()));
    }

    pub fn export_file_summary(&self, summary: &DbfSummary, file_path: &str) {
        // The schema is the command's output, so it ignores --quiet
        println!(
            "✅ File Analysis: {} - {} columns, {} rows",
            file_path, summary.n_columns, summary.n_rows
        );
        println!("📊 Field Details:");
        for (i, field) in summary.fields.iter().enumerate() {
            println!(
                "   {}: {} ({}) [{}]",
                i + 1,
                field.name,
                field.dbase_type,
                field.length
            );
        }
    }
}
