use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use tunefold::clock::SystemClock;
use tunefold::commands::{import, playlist, MoveTarget, SongsToAdd};
use tunefold::config::EngineConfig;
use tunefold::library::NewSong;
use tunefold::{AppState, Caller};

#[derive(Parser, Debug)]
#[command(name = "tunefold")]
#[command(about = "Ordered playlists imported from Spotify, YouTube and SoundCloud")]
#[command(version)]
struct Args {
    /// Config file (defaults to the user config directory)
    #[arg(short, long, env = "TUNEFOLD_CONFIG")]
    config: Option<PathBuf>,

    /// User the operations run as
    #[arg(short, long, default_value = "local", env = "TUNEFOLD_USER")]
    user: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a playlist or track URL
    Import {
        url: String,
        /// Append to this playlist instead of creating a new one
        #[arg(long)]
        into: Option<String>,
    },
    /// Create an empty playlist
    Create { name: String },
    /// List your playlists
    List,
    /// Show a playlist in order
    Show { playlist_id: String },
    /// Append songs, as library ids or "Artist - Title" pairs
    Add {
        playlist_id: String,
        #[arg(required = true)]
        songs: Vec<String>,
        /// Treat arguments as song ids
        #[arg(long)]
        ids: bool,
    },
    /// Move a song to a position, or between two ranks
    Move {
        playlist_id: String,
        song_id: String,
        #[arg(long, conflicts_with_all = ["after", "before"])]
        to: Option<usize>,
        /// Rank of the song that should come right before
        #[arg(long)]
        after: Option<String>,
        /// Rank of the song that should come right after
        #[arg(long)]
        before: Option<String>,
    },
    /// Remove a song from a playlist
    Remove { playlist_id: String, song_id: String },
    /// Delete a playlist
    Delete { playlist_id: String },
    /// Build a radio playlist from a library song
    Radio { seed_song_id: String },
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_song(raw: &str) -> NewSong {
    match raw.split_once(" - ") {
        Some((artist, title)) => NewSong::new(title.trim(), artist.trim()),
        None => NewSong::new(raw.trim(), tunefold::normalize::UNKNOWN_ARTIST),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = EngineConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    let state = AppState::from_config(&config, Arc::new(SystemClock))
        .await
        .context("Failed to initialize storage")?;
    let caller = Caller::new(args.user);

    match args.command {
        Command::Import { url, into } => {
            print(&import::import_playlist(&state, &caller, &url, into.as_deref()).await?)?
        }
        Command::Create { name } => print(&playlist::create_playlist(&state, &caller, &name).await?)?,
        Command::List => print(&playlist::list_playlists(&state, &caller).await?)?,
        Command::Show { playlist_id } => {
            print(&playlist::get_playlist_details(&state, &caller, &playlist_id).await?)?
        }
        Command::Add {
            playlist_id,
            songs,
            ids,
        } => {
            let songs = if ids {
                SongsToAdd::Ids(songs)
            } else {
                SongsToAdd::Songs(songs.iter().map(|s| parse_song(s)).collect())
            };
            print(&playlist::add_songs(&state, &caller, &playlist_id, songs).await?)?
        }
        Command::Move {
            playlist_id,
            song_id,
            to,
            after,
            before,
        } => {
            let target = match to {
                Some(index) => MoveTarget::Index(index),
                None => MoveTarget::Between {
                    previous: after,
                    next: before,
                },
            };
            let rank = playlist::move_song(&state, &caller, &playlist_id, &song_id, target).await?;
            println!("{}", rank);
        }
        Command::Remove { playlist_id, song_id } => {
            playlist::remove_song(&state, &caller, &playlist_id, &song_id).await?
        }
        Command::Delete { playlist_id } => playlist::delete_playlist(&state, &caller, &playlist_id).await?,
        Command::Radio { seed_song_id } => {
            print(&import::create_radio(&state, &caller, &seed_song_id).await?)?
        }
    }

    state.pool().close().await;
    Ok(())
}
