use anyhow::Result;
use lyra_etl::Config;
use lyra_search::{Catalog, QueryResult, SongHeader, SongSummary};

use super::App;

#[derive(Debug, Default)]
pub struct ListOptions {
    pub sort: Option<String>,
    pub search: String,
    pub headers: bool,
    pub json: bool,
}

enum Listing {
    Songs(Vec<SongSummary>),
    Headers(Vec<SongHeader>),
}

pub fn run_list(config: Config, options: &ListOptions) -> Result<()> {
    let mut app = App::start(config)?;
    let sort = options
        .sort
        .clone()
        .unwrap_or_else(|| app.status.sorting.clone());

    let db_path = app.config.database_path();
    let listing: QueryResult<Listing> = {
        let mut catalog = Catalog::new(db_path, &mut app.status);
        if options.headers {
            catalog
                .list_song_headers(&sort, &options.search)
                .map(Listing::Headers)
        } else {
            catalog.list_songs(&sort, &options.search).map(Listing::Songs)
        }
    };

    app.status.last_search.clone_from(&options.search);
    app.save()?;
    let listing = listing?;

    if options.json {
        let json = match &listing {
            Listing::Songs(songs) => serde_json::to_string_pretty(songs)?,
            Listing::Headers(headers) => serde_json::to_string_pretty(headers)?,
        };
        println!("{json}");
        return Ok(());
    }

    match listing {
        Listing::Songs(songs) => {
            for song in &songs {
                let author = if song.author_music.is_empty() {
                    &song.author_lyric
                } else {
                    &song.author_music
                };
                println!(
                    "{:>6} {:<4} {:>5}  {}  {}",
                    song.id, song.songbook_acronym, song.entry_text, song.title, author
                );
            }
            println!("\n{} songs", songs.len());
        }
        Listing::Headers(headers) => {
            for header in &headers {
                println!("{:>6} {:>5}  {}", header.id, header.entry_text, header.title);
            }
            println!("\n{} songs", headers.len());
        }
    }

    if !app.status.songs_ready || !app.status.database_ready {
        log::warn!("Song data is incomplete; run `lyra import`");
    }

    Ok(())
}
