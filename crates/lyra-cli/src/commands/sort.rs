use anyhow::Result;
use lyra_core::model::SortKey;
use lyra_etl::Config;

use super::App;

pub fn set_sort(config: Config, requested: &str) -> Result<()> {
    let mut app = App::start(config)?;
    let key = app.store.save_sorting(&mut app.status, requested)?;

    if SortKey::parse(requested.trim()).is_none() {
        println!("Unknown sort order {requested:?}, using {key}");
        println!(
            "Valid orders: {}",
            SortKey::ALL.iter().map(|k| k.as_str()).collect::<Vec<_>>().join(", ")
        );
    } else {
        println!("✓ Sorting by {key}");
    }
    Ok(())
}
