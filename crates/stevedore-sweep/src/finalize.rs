//! Terminal client-side effects for reconciled items.

use stevedore_config::GenreProfile;
use stevedore_qbit::{DownloadClient, Torrent};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::SweepResult;
use crate::stage::TAG_FINALIZED;

/// Finish one item on the client: delete its record, or tag it processed.
///
/// Exactly one of the two happens, per the genre's `delete_from_client`
/// flag; deletions never remove files, which were already reconciled away.
/// The genre's post-completion command runs afterwards and is best-effort:
/// its failure is logged without failing the item.
///
/// # Errors
/// Returns an error when the client rejects the terminal mutation.
pub(crate) async fn finalize(
    client: &dyn DownloadClient,
    torrent: &Torrent,
    genre_key: &str,
    genre: &GenreProfile,
) -> SweepResult<()> {
    let hashes = [torrent.hash.clone()];
    if genre.delete_from_client {
        client.delete_torrents(&hashes, false).await?;
        info!(hash = %torrent.hash, name = %torrent.name, "deleted finished item from client");
    } else {
        client
            .add_tags(&hashes, &[TAG_FINALIZED.to_string()])
            .await?;
        info!(hash = %torrent.hash, name = %torrent.name, "tagged finished item as processed");
    }
    if let Some(command) = genre.on_done.as_deref() {
        run_on_done(command, genre_key).await;
    }
    Ok(())
}

async fn run_on_done(command: &[String], genre_key: &str) {
    let Some((program, args)) = command.split_first() else {
        return;
    };
    debug!(genre = genre_key, program, "running post-completion command");
    match Command::new(program).args(args).output().await {
        Ok(output) if output.status.success() => {
            debug!(genre = genre_key, "post-completion command finished");
        }
        Ok(output) => {
            warn!(
                genre = genre_key,
                status = %output.status,
                "post-completion command exited with failure"
            );
        }
        Err(err) => {
            warn!(
                error = %err,
                genre = genre_key,
                program,
                "could not run post-completion command"
            );
        }
    }
}
