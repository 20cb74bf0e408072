use serde::{Deserialize, Serialize};

use super::{AppState, Caller};
use crate::errors::AppError;
use crate::library::NewSong;
use crate::playlist::{AppendOutcome, MembershipEntry, NewPlaylist, Playlist, PlaylistDetails};
use crate::rank::Rank;

/// Songs for `add_songs`: existing library ids, or song metadata to upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "items")]
pub enum SongsToAdd {
    Ids(Vec<String>),
    Songs(Vec<NewSong>),
}

/// Where `move_song` should put a song.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveTarget {
    /// Position in the ordered playlist, counted without the moved song.
    Index(usize),
    /// Ranks of the new neighbours; either may be absent.
    Between {
        previous: Option<String>,
        next: Option<String>,
    },
}

pub async fn create_playlist(state: &AppState, caller: &Caller, name: &str) -> Result<Playlist, AppError> {
    state
        .playlists()
        .create_playlist(NewPlaylist::playlist(name.trim(), caller.user_id.clone()))
        .await
}

pub async fn list_playlists(state: &AppState, caller: &Caller) -> Result<Vec<Playlist>, AppError> {
    state.playlists().list_playlists(&caller.user_id).await
}

pub async fn get_playlist_details(
    state: &AppState,
    caller: &Caller,
    playlist_id: &str,
) -> Result<PlaylistDetails, AppError> {
    let playlist = state.owned_playlist(caller, playlist_id).await?;
    let songs = state.playlists().get_playlist_songs(&playlist.id).await?;
    Ok(PlaylistDetails { playlist, songs })
}

pub async fn delete_playlist(state: &AppState, caller: &Caller, playlist_id: &str) -> Result<(), AppError> {
    state.owned_playlist(caller, playlist_id).await?;
    state.playlists().delete_playlist(playlist_id).await
}

/// Appends songs at the end of a playlist in one transaction.
pub async fn add_songs(
    state: &AppState,
    caller: &Caller,
    playlist_id: &str,
    songs: SongsToAdd,
) -> Result<AppendOutcome, AppError> {
    state.editable_playlist(caller, playlist_id).await?;

    if let SongsToAdd::Ids(ids) = &songs {
        let existing = state.songs().existing_ids(ids).await?;
        if let Some(missing) = ids.iter().find(|id| !existing.contains(*id)) {
            return Err(AppError::NotFound(format!("song {}", missing)));
        }
    }

    let mut tx = state.pool().begin().await?;
    let entries: Vec<MembershipEntry> = match songs {
        SongsToAdd::Ids(ids) => ids.into_iter().map(MembershipEntry::new).collect(),
        SongsToAdd::Songs(songs) => {
            let stored = state
                .songs()
                .upsert_songs(&mut *tx, &songs)
                .await
                .map_err(AppError::into_transaction_error)?;
            let ids = crate::library::index_by_key(stored);
            songs
                .iter()
                .filter_map(|song| ids.get(&song.key()))
                .map(|song| MembershipEntry::new(song.id.clone()))
                .collect()
        }
    };

    let outcome = state
        .playlists()
        .append(&mut *tx, playlist_id, &entries)
        .await
        .map_err(AppError::into_transaction_error)?;
    tx.commit()
        .await
        .map_err(|e| AppError::from(e).into_transaction_error())?;
    Ok(outcome)
}

/// Moves one song and returns its new rank.
pub async fn move_song(
    state: &AppState,
    caller: &Caller,
    playlist_id: &str,
    song_id: &str,
    target: MoveTarget,
) -> Result<Rank, AppError> {
    state.editable_playlist(caller, playlist_id).await?;

    match target {
        MoveTarget::Index(index) => state.playlists().move_to_index(playlist_id, song_id, index).await,
        MoveTarget::Between { previous, next } => {
            let previous = previous.as_deref().map(Rank::parse).transpose()?;
            let next = next.as_deref().map(Rank::parse).transpose()?;
            state
                .playlists()
                .move_song(playlist_id, song_id, previous.as_ref(), next.as_ref())
                .await
        }
    }
}

pub async fn remove_song(
    state: &AppState,
    caller: &Caller,
    playlist_id: &str,
    song_id: &str,
) -> Result<(), AppError> {
    state.editable_playlist(caller, playlist_id).await?;
    state.playlists().remove_song(playlist_id, song_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::library::SongKey;
    use crate::providers::ProviderManager;
    use crate::test_support;
    use std::sync::Arc;

    async fn setup() -> (AppState, Caller, Playlist) {
        let state = test_support::state(ProviderManager::new(), Arc::new(ManualClock::default())).await;
        let caller = Caller::new("u1");
        let playlist = create_playlist(&state, &caller, "Road Trip").await.unwrap();
        (state, caller, playlist)
    }

    fn songs(titles: &[&str]) -> SongsToAdd {
        SongsToAdd::Songs(titles.iter().map(|t| NewSong::new(*t, "Artist")).collect())
    }

    fn id(title: &str) -> String {
        SongKey::new(title, "Artist", None).song_id()
    }

    async fn titles(state: &AppState, caller: &Caller, playlist_id: &str) -> Vec<String> {
        get_playlist_details(state, caller, playlist_id)
            .await
            .unwrap()
            .songs
            .into_iter()
            .map(|s| s.title)
            .collect()
    }

    #[tokio::test]
    async fn add_then_conflict_then_partial() {
        let (state, caller, playlist) = setup().await;

        let outcome = add_songs(&state, &caller, &playlist.id, songs(&["A"])).await.unwrap();
        assert_eq!(outcome.added, 1);

        let err = add_songs(&state, &caller, &playlist.id, SongsToAdd::Ids(vec![id("A")]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let outcome = add_songs(&state, &caller, &playlist.id, songs(&["A", "B"])).await.unwrap();
        assert_eq!(outcome, AppendOutcome { added: 1, skipped: 1 });
        assert_eq!(titles(&state, &caller, &playlist.id).await, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn unknown_song_ids_are_rejected() {
        let (state, caller, playlist) = setup().await;
        let err = add_songs(&state, &caller, &playlist.id, SongsToAdd::Ids(vec!["nope".into()]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn moves_by_index_and_by_rank() {
        let (state, caller, playlist) = setup().await;
        add_songs(&state, &caller, &playlist.id, songs(&["A", "B", "C"])).await.unwrap();

        move_song(&state, &caller, &playlist.id, &id("C"), MoveTarget::Index(0)).await.unwrap();
        assert_eq!(titles(&state, &caller, &playlist.id).await, vec!["C", "A", "B"]);

        let details = get_playlist_details(&state, &caller, &playlist.id).await.unwrap();
        let target = MoveTarget::Between {
            previous: Some(details.songs[1].rank.clone()),
            next: Some(details.songs[2].rank.clone()),
        };
        move_song(&state, &caller, &playlist.id, &id("C"), target).await.unwrap();
        assert_eq!(titles(&state, &caller, &playlist.id).await, vec!["A", "C", "B"]);

        let bad = MoveTarget::Between {
            previous: Some("a0".into()),
            next: None,
        };
        let err = move_song(&state, &caller, &playlist.id, &id("C"), bad).await.unwrap_err();
        assert!(matches!(err, AppError::MalformedRank(_)));
    }

    #[tokio::test]
    async fn other_users_are_unauthorized() {
        let (state, caller, playlist) = setup().await;
        add_songs(&state, &caller, &playlist.id, songs(&["A"])).await.unwrap();
        let intruder = Caller::new("u2");

        for err in [
            add_songs(&state, &intruder, &playlist.id, songs(&["B"])).await.unwrap_err(),
            remove_song(&state, &intruder, &playlist.id, &id("A")).await.unwrap_err(),
            delete_playlist(&state, &intruder, &playlist.id).await.unwrap_err(),
            get_playlist_details(&state, &intruder, &playlist.id).await.map(|_| ()).unwrap_err(),
            move_song(&state, &intruder, &playlist.id, &id("A"), MoveTarget::Index(0))
                .await
                .map(|_| ())
                .unwrap_err(),
        ] {
            assert!(matches!(err, AppError::Unauthorized(_)), "{:?}", err);
        }
        assert!(list_playlists(&state, &intruder).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn radio_playlists_are_read_only() {
        let (state, caller, _) = setup().await;
        add_songs(&state, &caller, &create_playlist(&state, &caller, "Seeds").await.unwrap().id, songs(&["Seed"]))
            .await
            .unwrap();
        let radio = state
            .playlists()
            .create_playlist(NewPlaylist::radio("Seed Radio", "u1", id("Seed")))
            .await
            .unwrap();

        let err = add_songs(&state, &caller, &radio.id, songs(&["X"])).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        let err = remove_song(&state, &caller, &radio.id, &id("Seed")).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        delete_playlist(&state, &caller, &radio.id).await.unwrap();
    }

    #[tokio::test]
    async fn delete_cascades() {
        let (state, caller, playlist) = setup().await;
        add_songs(&state, &caller, &playlist.id, songs(&["A", "B"])).await.unwrap();

        delete_playlist(&state, &caller, &playlist.id).await.unwrap();

        assert_eq!(test_support::count(&state, "playlist_songs").await, 0);
        assert_eq!(test_support::count(&state, "songs").await, 2);
        assert!(list_playlists(&state, &caller).await.unwrap().is_empty());
    }
}
