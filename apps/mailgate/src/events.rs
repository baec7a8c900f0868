//! Event handling and progress display

use crate::logging::log_event_with_tracing;
use console::{style, Term};
use mailgate_events::{
    AppEvent, EventLevel, EventMessage, GeneralEvent, PacingEvent, RunEvent, VerificationEvent,
};

/// Event handler for progress display and user feedback
///
/// Progress goes to stderr so stdout only carries results.
pub struct EventHandler {
    term: Term,
    colors_enabled: bool,
    debug_enabled: bool,
    /// Suppress progress lines (JSON mode)
    quiet: bool,
    /// Addresses dispatched so far
    dispatched: usize,
    /// Entries in the current run
    total: usize,
}

impl EventHandler {
    /// Create new event handler
    pub fn new(colors_enabled: bool, debug_enabled: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            colors_enabled,
            debug_enabled,
            quiet,
            dispatched: 0,
            total: 0,
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, message: &EventMessage) {
        log_event_with_tracing(message);

        if let Some(line) = self.render(&message.event) {
            if self.visible(message.meta.level) {
                self.show(&line);
            }
        }
    }

    /// Debug-level lines need `--debug`; nothing shows in JSON mode
    fn visible(&self, level: EventLevel) -> bool {
        !self.quiet && (self.debug_enabled || level > EventLevel::Debug)
    }

    /// Report that an interrupt was received
    pub fn show_interrupt(&self) {
        if !self.quiet {
            self.show(&self.warn("Interrupted, finishing the current address..."));
        }
    }

    fn render(&mut self, event: &AppEvent) -> Option<String> {
        match event {
            AppEvent::General(general) => self.render_general(general),
            AppEvent::Run(run) => self.render_run(run),
            AppEvent::Verification(verification) => self.render_verification(verification),
            AppEvent::Pacing(pacing) => self.render_pacing(pacing),
        }
    }

    fn render_general(&self, event: &GeneralEvent) -> Option<String> {
        match event {
            GeneralEvent::Warning { message } => Some(self.warn(message)),
            GeneralEvent::DebugLog { message } => Some(format!("[debug] {message}")),
        }
    }

    fn render_run(&mut self, event: &RunEvent) -> Option<String> {
        match event {
            RunEvent::Started {
                total, max_results, ..
            } => {
                self.total = *total;
                self.dispatched = 0;
                Some(format!(
                    "Verifying {total} {} (cap {max_results})",
                    plural(*total, "address", "addresses")
                ))
            }
            RunEvent::CapReached {
                max_results,
                remaining,
            } => Some(self.warn(&format!(
                "Result cap of {max_results} reached, {remaining} {} not processed",
                plural(*remaining, "entry", "entries")
            ))),
            RunEvent::BatchEmitted { sink, count } => (sink != "memory").then(|| {
                format!(
                    "Wrote {count} {} to {sink}",
                    plural(*count, "record", "records")
                )
            }),
            RunEvent::Completed { .. } => None,
            RunEvent::Cancelled { processed, .. } => Some(self.warn(&format!(
                "Cancelled after {processed} {}",
                plural(*processed, "verification", "verifications")
            ))),
        }
    }

    fn render_verification(&mut self, event: &VerificationEvent) -> Option<String> {
        match event {
            VerificationEvent::Skipped {
                position,
                input,
                reason,
            } => Some(self.warn(&format!("#{} {input}: {reason}", position + 1))),
            VerificationEvent::Started { .. } => {
                self.dispatched += 1;
                None
            }
            VerificationEvent::Verified { email, status } => Some(format!(
                "{} {email}: {status}",
                self.counter_paint(true)
            )),
            VerificationEvent::NoData { email } => Some(format!(
                "{} {email}: {}",
                self.counter_paint(false),
                mailgate_types::NO_VERIFICATION_DATA
            )),
            VerificationEvent::Failed { email, failure } => Some(format!(
                "{} {email}: {}",
                self.counter_paint(false),
                failure.message
            )),
        }
    }

    fn render_pacing(&self, event: &PacingEvent) -> Option<String> {
        match event {
            PacingEvent::WindowReset { .. } => None,
            PacingEvent::Waiting { wait_ms, quota } => Some(self.warn(&format!(
                "Quota of {quota} calls per window reached, pausing {:.1}s",
                std::time::Duration::from_millis(*wait_ms).as_secs_f64()
            ))),
            PacingEvent::Resumed { .. } => Some("Resuming".to_string()),
        }
    }

    /// `[n/total]` prefix, green on success and red otherwise
    fn counter_paint(&self, ok: bool) -> String {
        let counter = format!("[{}/{}]", self.dispatched, self.total);
        if !self.colors_enabled {
            return counter;
        }
        if ok {
            style(counter).green().to_string()
        } else {
            style(counter).red().to_string()
        }
    }

    fn warn(&self, message: &str) -> String {
        if self.colors_enabled {
            style(message).yellow().to_string()
        } else {
            format!("warning: {message}")
        }
    }

    fn show(&self, line: &str) {
        // A closed stderr is not worth failing the run over
        let _ = self.term.write_line(line);
    }
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 {
        one
    } else {
        many
    }
}
