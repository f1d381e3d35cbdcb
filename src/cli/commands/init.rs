use crate::config::Config;

pub fn cmd_init_config() -> anyhow::Result<()> {
    let path = Config::default_config_path();
    if Config::create_default_if_missing()? {
        println!("✓ Config file created at {}", path.display());
        println!("  Edit it and run `concert-hub serve`.");
    } else {
        println!("Config file already exists at {}", path.display());
    }
    Ok(())
}
