use super::{AppState, Caller};
use crate::errors::AppError;
use crate::playlist::Playlist;

pub async fn import_playlist(
    state: &AppState,
    caller: &Caller,
    url: &str,
    target_playlist_id: Option<&str>,
) -> Result<Playlist, AppError> {
    state
        .importer()
        .import_playlist(&caller.user_id, url, target_playlist_id)
        .await
}

pub async fn create_radio(state: &AppState, caller: &Caller, seed_song_id: &str) -> Result<Playlist, AppError> {
    state.importer().create_radio(&caller.user_id, seed_song_id).await
}
