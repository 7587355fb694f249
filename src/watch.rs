use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use arboard::Clipboard;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::coords::is_maps_url;

/// Decides which clipboard values are new maps URLs.
#[derive(Debug)]
pub struct UrlGate {
    marker: String,
    last_seen: Option<String>,
}

impl UrlGate {
    pub fn new(marker: &str) -> Self {
        Self {
            marker: marker.to_string(),
            last_seen: None,
        }
    }

    /// The trimmed value, if it is a maps URL different from the last one accepted.
    pub fn offer(&mut self, raw: &str) -> Option<String> {
        let candidate = raw.trim();
        if !is_maps_url(candidate, &self.marker) {
            return None;
        }
        if self.last_seen.as_deref() == Some(candidate) {
            return None;
        }
        self.last_seen = Some(candidate.to_string());
        Some(candidate.to_string())
    }
}

/// Polls the clipboard text and hands each new maps URL to a callback.
pub struct ClipboardWatcher {
    clipboard: Clipboard,
    gate: UrlGate,
    interval: Duration,
}

impl ClipboardWatcher {
    pub fn new(marker: &str, interval: Duration) -> Result<Self> {
        let clipboard = Clipboard::new().context("Failed to open the clipboard")?;
        Ok(Self {
            clipboard,
            gate: UrlGate::new(marker),
            interval,
        })
    }

    /// Run until `handle` returns `false`. The callback gets each new URL once.
    pub fn run<F>(&mut self, mut handle: F) -> Result<()>
    where
        F: FnMut(&str) -> bool,
    {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
        pb.set_message("Waiting for a Google Maps URL on the clipboard...");
        pb.enable_steady_tick(Duration::from_millis(120));

        loop {
            let text = match self.clipboard.get_text() {
                Ok(text) => text,
                Err(e) => {
                    // Empty clipboard or non-text content.
                    debug!("Clipboard read skipped: {}", e);
                    String::new()
                }
            };

            if let Some(url) = self.gate.offer(&text) {
                let keep_going = pb.suspend(|| handle(&url));
                if !keep_going {
                    break;
                }
            }
            thread::sleep(self.interval);
        }

        pb.finish_and_clear();
        Ok(())
    }
}
