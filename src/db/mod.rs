mod client;
mod models;

pub use client::Database;
pub use models::{DbPlaylist, DbSong, ALL_SONGS_PLAYLIST};
