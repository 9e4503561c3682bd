//! Batched library rescans after new files land.

use stevedore_config::RescanSettings;
use stevedore_qbit::DownloadClient;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{SweepError, SweepResult};
use crate::stage::TAG_SCANNED;

/// Run the configured rescan command once for the whole batch, then tag
/// every item in it as scanned.
///
/// A configured up-to-date marker classifies the command's stdout; without
/// one the exit status decides. Either way the batch is tagged: rescans are
/// idempotent at the library level and a misreported scan is retried by the
/// operator, not by re-running the command per pass.
///
/// # Errors
/// Returns an error when the command cannot be spawned or the client
/// rejects the tagging call.
pub(crate) async fn rescan(
    client: &dyn DownloadClient,
    settings: &RescanSettings,
    hashes: &[String],
) -> SweepResult<()> {
    if hashes.is_empty() {
        return Ok(());
    }
    let Some((program, args)) = settings.command.split_first() else {
        return Ok(());
    };
    info!(items = hashes.len(), program, "running library rescan");
    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|err| SweepError::command(program, err))?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    match settings.up_to_date_marker.as_deref() {
        Some(marker) if stdout.contains(marker) => {
            debug!(stdout = %stdout.trim(), "library rescan reported up to date");
        }
        Some(_) => {
            warn!(stdout = %stdout.trim(), "library rescan did not report up to date");
        }
        None if output.status.success() => debug!("library rescan finished"),
        None => warn!(status = %output.status, "library rescan exited with failure"),
    }
    client
        .add_tags(hashes, &[TAG_SCANNED.to_string()])
        .await?;
    Ok(())
}
