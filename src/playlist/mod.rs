pub mod manager;
pub mod models;

pub use manager::PlaylistManager;
pub use models::{
    AppendOutcome, Membership, MembershipEntry, NewPlaylist, Playlist, PlaylistDetails, PlaylistKind,
    PlaylistSong,
};
