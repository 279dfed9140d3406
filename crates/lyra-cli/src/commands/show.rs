use anyhow::Result;
use lyra_etl::Config;
use lyra_search::{Catalog, QueryResult};

use super::App;

/// Run one catalog query, saving the status when the query failed.
fn query<T>(
    config: Config,
    f: impl FnOnce(&mut Catalog<'_>) -> QueryResult<T>,
) -> Result<T> {
    let mut app = App::start(config)?;
    let db_path = app.config.database_path();
    let result = f(&mut Catalog::new(db_path, &mut app.status));
    if result.is_err() {
        app.save()?;
    }
    Ok(result?)
}

pub fn show_authors(config: Config, song_id: i64) -> Result<()> {
    let authors = query(config, |catalog| catalog.get_authors(song_id))?;
    if authors.is_empty() {
        println!("No authors recorded for song {song_id}");
    }
    for author in &authors {
        println!("{:<6} {}", author.role, author.value);
    }
    Ok(())
}

pub fn show_verses(config: Config, song_id: i64) -> Result<()> {
    let verses = query(config, |catalog| catalog.get_verses(song_id))?;
    if verses.is_empty() {
        println!("No verses for song {song_id}");
        return Ok(());
    }
    for verse in verses.split(lyra_search::catalog::VERSE_SEPARATOR) {
        println!("{verse}\n");
    }
    Ok(())
}

pub fn show_projection(config: Config, song_id: i64) -> Result<()> {
    let json = query(config, |catalog| catalog.get_projection_json(song_id))?;
    println!("{json}");
    Ok(())
}
