// ABOUTME: Progress reporting for deploy feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes.

use crate::provider::StackEvent;
use serde::Serialize;
use std::time::Instant;

/// Output mode for deploy feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Renders deploy progress and stack activity based on the configured mode.
pub struct Reporter {
    mode: OutputMode,
    start_time: Instant,
}

impl Reporter {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: Instant::now(),
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Elapsed time since the reporter was created.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Render one stack event, annotated with the running count and the
    /// total number of expected resource changes when known.
    pub fn stack_event(
        &self,
        seen: usize,
        total: Option<usize>,
        event: &StackEvent,
        construct_path: Option<&str>,
    ) {
        let logical_id = event.logical_resource_id.as_deref().unwrap_or("-");
        let display_id = construct_path.unwrap_or(logical_id);

        match self.mode {
            OutputMode::Normal => {
                let counter = match total {
                    Some(total) => format!("{seen:>3}/{total}"),
                    None => format!("{seen:>3}"),
                };
                let status = event.resource_status.as_deref().unwrap_or("-");
                let resource_type = event.resource_type.as_deref().unwrap_or("-");
                let reason = event
                    .resource_status_reason
                    .as_deref()
                    .map(|r| format!(" ({r})"))
                    .unwrap_or_default();

                let line =
                    format!("{counter} | {status} | {resource_type} | {display_id}{reason}");
                if event.is_failure() {
                    eprintln!("{line}");
                } else {
                    println!("{line}");
                }
            }
            OutputMode::Quiet => {}
            OutputMode::Json => {
                let json_event = JsonStackEvent {
                    event: "stack-event",
                    seen,
                    total,
                    logical_id: display_id,
                    resource_type: event.resource_type.as_deref(),
                    status: event.resource_status.as_deref(),
                    reason: event.resource_status_reason.as_deref(),
                };
                if let Ok(json) = serde_json::to_string(&json_event) {
                    println!("{json}");
                }
            }
        }
    }

    /// Print a success message with timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                println!("{message} ({:.1}s)", self.elapsed_secs());
            }
            OutputMode::Quiet => {
                println!("{message}");
            }
            OutputMode::Json => {
                let event = JsonResult {
                    event: "success",
                    message,
                    duration_secs: self.elapsed_secs(),
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    println!("{json}");
                }
            }
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => {
                let event = JsonResult {
                    event: "error",
                    message,
                    duration_secs: self.elapsed_secs(),
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    eprintln!("{json}");
                }
            }
        }
    }
}

#[derive(Serialize)]
struct JsonResult<'a> {
    event: &'a str,
    message: &'a str,
    duration_secs: f64,
}

#[derive(Serialize)]
struct JsonStackEvent<'a> {
    event: &'a str,
    seen: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    total: Option<usize>,
    logical_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    resource_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}
