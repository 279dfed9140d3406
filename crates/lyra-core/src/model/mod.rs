pub mod author;
pub mod song;
pub mod songbook;
pub mod sort;
pub mod status;
pub mod verse;

pub use author::{Author, AuthorRole};
pub use song::{NewSong, Song};
pub use songbook::{Songbook, MAX_ACRONYM_LEN};
pub use sort::SortKey;
pub use status::AppStatus;
pub use verse::Verse;
