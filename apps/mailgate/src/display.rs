//! Output rendering and formatting

use comfy_table::{
    presets::{ASCII_FULL, UTF8_FULL},
    Attribute, Cell, Color, ContentArrangement, Table,
};
use console::{Style, Term};
use mailgate_ops::{ConfigSnapshot, OperationResult, VerificationReport};
use mailgate_types::{ColorChoice, VerificationRecord};
use std::io;
use std::time::Duration;

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    /// Color configuration
    color_choice: ColorChoice,
    /// ASCII tables without styling
    plain: bool,
    /// List every record under the summary
    show_records: bool,
    /// Terminal instance
    term: Term,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool, color_choice: ColorChoice, plain: bool) -> Self {
        Self {
            json_output,
            color_choice,
            plain,
            show_records: true,
            term: Term::stdout(),
        }
    }

    /// Records were already written elsewhere; only summarize them
    ///
    /// When they went to stdout, the summary moves to stderr.
    #[must_use]
    pub fn records_emitted(mut self, to_stdout: bool) -> Self {
        self.show_records = false;
        if to_stdout {
            self.term = Term::stderr();
        }
        self
    }

    /// Render operation result
    pub fn render_result(&self, result: &OperationResult) -> io::Result<()> {
        if self.json_output {
            self.render_json(result)
        } else {
            self.render_table(result)
        }
    }

    /// Render as JSON
    fn render_json(&self, result: &OperationResult) -> io::Result<()> {
        let json = match result {
            OperationResult::Verification(report) if !self.show_records => {
                serde_json::to_string_pretty(&serde_json::json!({
                    "type": "Verification",
                    "data": {
                        "run_id": report.run_id,
                        "summary": report.summary,
                        "cancelled": report.cancelled,
                        "elapsed_ms": report.elapsed_ms,
                    }
                }))
                .map_err(io::Error::other)?
            }
            _ => result.to_json().map_err(io::Error::other)?,
        };
        self.term.write_line(&json)
    }

    /// Render as formatted table
    fn render_table(&self, result: &OperationResult) -> io::Result<()> {
        match result {
            OperationResult::Verification(report) => self.render_report(report),
            OperationResult::Config(snapshot) => self.render_config(snapshot),
        }
    }

    fn render_report(&self, report: &VerificationReport) -> io::Result<()> {
        if self.show_records && !report.records.is_empty() {
            self.render_records(&report.records)?;
            self.term.write_line("")?;
        }

        let mut table = self.table();
        table.set_header(vec![self.header("Summary"), self.header("")]);

        let summary = &report.summary;
        table.add_row(vec![Cell::new("Input addresses"), Cell::new(summary.total)]);
        table.add_row(vec![Cell::new("Records"), Cell::new(summary.emitted())]);
        table.add_row(vec![
            Cell::new("Successful"),
            self.paint(Cell::new(summary.successful), Color::Green),
        ]);
        table.add_row(vec![
            Cell::new("Failed"),
            self.paint(
                Cell::new(summary.failed),
                if summary.failed == 0 {
                    Color::Green
                } else {
                    Color::Red
                },
            ),
        ]);
        table.add_row(vec![
            Cell::new("Elapsed"),
            Cell::new(format_duration(report.elapsed_ms)),
        ]);
        if report.cancelled {
            table.add_row(vec![
                Cell::new("Cancelled"),
                self.paint(Cell::new("yes"), Color::Yellow),
            ]);
        }

        self.term.write_line(&table.to_string())
    }

    fn render_records(&self, records: &[VerificationRecord]) -> io::Result<()> {
        let mut table = self.table();
        table.set_header(vec![
            self.header("Input"),
            self.header("Result"),
            self.header("Detail"),
        ]);

        for record in records {
            let (result, detail) = match record.error() {
                Some(error) => (self.paint(Cell::new("failed"), Color::Red), error.to_string()),
                None => (
                    self.paint(Cell::new("verified"), Color::Green),
                    record.status().unwrap_or("Unknown").to_string(),
                ),
            };
            table.add_row(vec![Cell::new(record.input_display()), result, Cell::new(detail)]);
        }

        self.term.write_line(&table.to_string())
    }

    fn render_config(&self, snapshot: &ConfigSnapshot) -> io::Result<()> {
        let source = snapshot
            .source
            .as_ref()
            .map_or_else(|| "(defaults)".to_string(), |p| p.display().to_string());
        self.term
            .write_line(&format!("{} {source}", self.style_label("Config:")))?;

        let config = &snapshot.config;
        let output_path = config
            .output
            .path
            .as_ref()
            .map_or_else(|| "-".to_string(), |p| p.display().to_string());

        let mut table = self.table();
        table.set_header(vec![self.header("Setting"), self.header("Value")]);
        for (key, value) in [
            ("general.color", format!("{:?}", config.general.color).to_lowercase()),
            (
                "general.default_output",
                format!("{:?}", config.general.default_output).to_lowercase(),
            ),
            ("api.base_url", config.api.base_url.clone()),
            ("pacing.quota", config.pacing.quota.to_string()),
            ("pacing.window_ms", config.pacing.window_ms.to_string()),
            ("network.timeout", format!("{}s", config.network.timeout)),
            (
                "network.connect_timeout",
                format!("{}s", config.network.connect_timeout),
            ),
            (
                "run.default_max_results",
                config.run.default_max_results.to_string(),
            ),
            ("output.path", output_path),
            ("output.format", config.output.format.to_string()),
            ("logging.dir", config.log_dir().display().to_string()),
        ] {
            table.add_row(vec![Cell::new(key), Cell::new(value)]);
        }

        self.term.write_line(&table.to_string())
    }

    fn table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(if self.plain { ASCII_FULL } else { UTF8_FULL })
            .set_content_arrangement(ContentArrangement::Dynamic);
        table
    }

    fn header(&self, text: &str) -> Cell {
        let cell = Cell::new(text);
        if self.supports_color() {
            cell.add_attribute(Attribute::Bold)
        } else {
            cell
        }
    }

    fn paint(&self, cell: Cell, color: Color) -> Cell {
        if self.supports_color() {
            cell.fg(color)
        } else {
            cell
        }
    }

    fn style_label(&self, label: &str) -> String {
        if self.supports_color() {
            Style::new().bold().apply_to(label).to_string()
        } else {
            label.to_string()
        }
    }

    /// Check if color output is supported
    fn supports_color(&self) -> bool {
        if self.plain {
            return false;
        }
        match self.color_choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.term.features().colors_supported(),
        }
    }
}

/// Format milliseconds as a short human readable duration
fn format_duration(ms: u64) -> String {
    if ms < 1_000 {
        format!("{ms}ms")
    } else if ms < 60_000 {
        format!("{:.1}s", Duration::from_millis(ms).as_secs_f64())
    } else {
        format!("{}m {:02}s", ms / 60_000, (ms % 60_000) / 1_000)
    }
}
