use anyhow::{bail, Context, Result};
use lyra_etl::{config, Config};
use toml_edit::{value, DocumentMut, Item, Table};

/// Keys `config get` and `config set` understand.
const KEYS: &[&str] = &[
    "data_dir",
    "database_path",
    "test_run",
    "logging.level",
    "logging.coloured",
    "logging.report_caller",
    "logging.output",
];

/// Show the current effective configuration.
pub fn show_config(config: &Config) -> Result<()> {
    println!("Current Configuration");
    println!("=====================\n");

    println!("Config file: {}", config::config_file_path().display());

    let exists = config::config_file_path().exists();
    println!(
        "File exists: {}\n",
        if exists { "yes" } else { "no (using defaults)" }
    );

    println!("Settings:");
    for key in KEYS {
        println!("  {key}: {}", lookup(config, key)?);
    }
    println!("  songbooks:");
    for source in &config.songbooks {
        println!(
            "    {} ({}) at {}{}",
            source.acronym,
            source.name,
            source.path.display(),
            if source.required { ", required" } else { "" }
        );
    }
    println!("  supplemental_pdfs:");
    for pdf in &config.supplemental_pdfs {
        println!("    {} <- {}", pdf.target_name(), pdf.url);
    }

    println!("\nPriority: CLI args > ENV vars (LYRA_*) > Config file > Defaults");

    Ok(())
}

/// Get a specific config value.
pub fn get_config(config: &Config, key: Option<String>) -> Result<()> {
    if let Some(key) = key {
        println!("{}", lookup(config, &key)?);
    } else {
        let config_path = config::config_file_path();

        if config_path.exists() {
            let contents =
                std::fs::read_to_string(&config_path).context("Failed to read config file")?;
            print!("{contents}");
        } else {
            println!("Config file does not exist: {}", config_path.display());
            println!("\nRun 'lyra config init' to create it.");
        }
    }

    Ok(())
}

fn lookup(config: &Config, key: &str) -> Result<String> {
    let text = match key {
        "data_dir" => config.data_dir.display().to_string(),
        "database_path" => config.database_path().display().to_string(),
        "test_run" => config.test_run.to_string(),
        "logging.level" => config.logging.level.clone(),
        "logging.coloured" => config.logging.coloured.to_string(),
        "logging.report_caller" => config.logging.report_caller.to_string(),
        "logging.output" => config.logging.output.clone(),
        _ => bail!(
            "Unknown config key: {key}\n\nValid keys: {}",
            KEYS.join(", ")
        ),
    };
    Ok(text)
}

/// Set a config value, keeping the rest of the file and its comments.
pub fn set_config(key: &str, raw: &str) -> Result<()> {
    let config_path = config::config_file_path();

    config::ensure_config_file()?;

    let contents = std::fs::read_to_string(&config_path).context("Failed to read config file")?;
    let mut doc: DocumentMut = contents
        .parse()
        .with_context(|| format!("Failed to parse {}", config_path.display()))?;
    set_value(&mut doc, key, raw)?;

    std::fs::write(&config_path, doc.to_string()).context("Failed to write config file")?;

    println!("✓ Updated {key} = {raw}");
    println!("  in {}", config_path.display());

    Ok(())
}

fn set_value(doc: &mut DocumentMut, key: &str, raw: &str) -> Result<()> {
    let item = match key {
        "data_dir" | "database_path" | "logging.level" | "logging.output" => value(raw),
        "test_run" | "logging.coloured" | "logging.report_caller" => {
            let flag: bool = raw
                .parse()
                .with_context(|| format!("{key} expects true or false, got {raw:?}"))?;
            value(flag)
        }
        _ => bail!(
            "Unknown config key: {key}\n\nValid keys: {}",
            KEYS.join(", ")
        ),
    };

    match key.split_once('.') {
        Some((section, name)) => {
            let table = doc
                .entry(section)
                .or_insert(Item::Table(Table::new()))
                .as_table_mut()
                .with_context(|| format!("{section} is not a table"))?;
            table[name] = item;
        }
        None => doc[key] = item,
    }
    Ok(())
}

/// Show the config file path.
pub fn show_path() -> Result<()> {
    let config_path = config::config_file_path();
    println!("{}", config_path.display());
    Ok(())
}

/// Show example configuration.
pub fn show_example() -> Result<()> {
    print!("{}", config::example_config());
    Ok(())
}

/// Initialize config file with defaults.
pub fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to configure lyra.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}
