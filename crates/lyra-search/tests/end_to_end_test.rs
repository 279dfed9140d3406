//! Import an EZ song file and query it back.

use lyra_core::model::AppStatus;
use lyra_core::schema::Database;
use lyra_etl::{ImportOptions, Importer, SongbookSource};
use lyra_search::Catalog;

const SONG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<song xmlns="http://openlyrics.info/namespace/2009/song" version="0.8">
  <properties>
    <titles><title>ABCčDďE</title></titles>
    <songbooks><songbook name="Evangelický zpěvník" entry="288"/></songbooks>
    <verseOrder>v1 v2</verseOrder>
  </properties>
  <lyrics>
    <verse name="v1"><lines>První sloka</lines></verse>
    <verse name="v2"><lines>Druhá sloka</lines></verse>
  </lyrics>
</song>
"#;

#[test]
fn test_import_then_search() {
    let temp_dir = tempfile::tempdir().unwrap();
    let songbook_root = temp_dir.path().join("SongBook");
    std::fs::create_dir_all(songbook_root.join("EZ")).unwrap();
    std::fs::write(songbook_root.join("EZ").join("288.xml"), SONG).unwrap();

    let db_path = temp_dir.path().join("Songs.db");
    let db = Database::open(&db_path).unwrap();
    let report = Importer::new(
        &songbook_root,
        SongbookSource::defaults(),
        ImportOptions::default(),
    )
    .run(&db, &mut |_| {})
    .unwrap();
    assert_eq!(report.imported(), 1);
    drop(db);

    let mut status = AppStatus {
        database_ready: true,
        ..AppStatus::default()
    };
    let mut catalog = Catalog::new(&db_path, &mut status);

    let all = catalog.list_songs("entry", "").unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].title, "ABCčDďE");
    assert_eq!(all[0].entry_number, 288);
    assert_eq!(all[0].verses, "První sloka\n\nDruhá sloka");

    let found = catalog.list_songs("entry", "abccdde").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "ABCčDďE");

    assert_eq!(catalog.list_songs("entry", "288").unwrap().len(), 1);
    assert!(catalog.list_songs("entry", "28").unwrap().is_empty());
    assert!(catalog.list_songs("entry", "nic takového").unwrap().is_empty());

    let projection = catalog.get_projection(all[0].id).unwrap();
    assert_eq!(projection.verse_order, "v1 v2");
    assert_eq!(
        catalog.get_verses(all[0].id).unwrap(),
        "První sloka===Druhá sloka"
    );
    drop(catalog);
    assert!(status.database_ready);
}
