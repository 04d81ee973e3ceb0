//! Spinner output for readiness polling

use dbaasctl_core::{ProgressCallback, ProgressEvent};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner driven by the workflow's progress events
///
/// indicatif draws to stderr and stays hidden when stderr is not a terminal,
/// so structured stdout output is unaffected.
pub struct RunSpinner {
    pb: ProgressBar,
}

impl RunSpinner {
    pub fn new(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed_precise}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        pb.set_message(message.to_string());
        Self { pb }
    }

    /// Callback that forwards progress events to this spinner
    pub fn callback(&self) -> ProgressCallback {
        let pb = self.pb.clone();
        Box::new(move |event: ProgressEvent| pb.set_message(describe(&event)))
    }

    pub fn finish(&self, message: &str) {
        self.pb.finish_with_message(message.to_string());
    }

    pub fn abandon(&self) {
        self.pb.finish_and_clear();
    }
}

/// One-line description of a progress event
pub fn describe(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::Started { resource, id } => {
            format!("Waiting for {} {}", resource, id)
        }
        ProgressEvent::Polling {
            resource,
            id,
            attempt,
            max_attempts,
            status,
        } => format!(
            "{} {}: {} (check {}/{})",
            resource, id, status, attempt, max_attempts
        ),
        ProgressEvent::Ready {
            resource,
            id,
            attempts,
        } => format!("{} {} ready after {} checks", resource, id, attempts),
        ProgressEvent::Exhausted {
            resource,
            id,
            attempts,
            last_status,
        } => format!(
            "{} {} still '{}' after {} checks",
            resource, id, last_status, attempts
        ),
    }
}
