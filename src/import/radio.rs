use super::orchestrator::{normalize_tracks, ImportOrchestrator};
use super::ImportStage;
use crate::errors::AppError;
use crate::playlist::{NewPlaylist, Playlist};

impl ImportOrchestrator {
    /// Builds a RADIO playlist from the related-content mix of one song.
    ///
    /// The seed song is the first entry; mix tracks follow in mix order.
    pub async fn create_radio(&self, owner_id: &str, seed_song_id: &str) -> Result<Playlist, AppError> {
        let seed = self.songs.get_song(seed_song_id).await?;
        let query = format!("{} {}", seed.artist, seed.title);
        log::info!("[{}] radio mix for '{}'", ImportStage::Fetch, query);

        let radio = self.providers().radio()?;
        let mix = self
            .bounded(radio.fetch_mix(&query))
            .await
            .inspect_err(|e| log::warn!("[{}] mix for '{}' failed: {}", ImportStage::Aborted, query, e))?;

        let tracks: Vec<_> = normalize_tracks(mix)
            .into_iter()
            .filter(|t| t.song.key() != seed.key())
            .collect();
        if tracks.is_empty() {
            return Err(AppError::NoTracksFound(format!("no mix for '{}'", query)));
        }

        let new_playlist = NewPlaylist::radio(format!("{} Radio", seed.title), owner_id, seed.id.clone());
        let playlist = self
            .commit(None, new_playlist, std::slice::from_ref(&seed.id), &tracks)
            .await?;

        log::info!(
            "[{}] radio {} with {} tracks",
            ImportStage::Committed,
            playlist.id,
            tracks.len() + 1
        );
        Ok(playlist)
    }
}
