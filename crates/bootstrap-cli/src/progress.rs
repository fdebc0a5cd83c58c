//! Progress indicators for dispatch runs

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a spinner counting handled records
///
/// The position is the number of records stored (or deleted) so far.
pub fn create_record_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg} {pos} records")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
