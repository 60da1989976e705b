//! Theme preference handlers.

use anyhow::Result;
use tuto_core::config;
use tuto_core::prefs::Preferences;

fn label(dark_mode: bool) -> &'static str {
    if dark_mode { "sombre" } else { "clair" }
}

pub fn set(dark_mode: bool) -> Result<()> {
    let path = config::paths::prefs_path();
    let mut prefs = Preferences::load_from(&path);
    prefs.dark_mode = dark_mode;
    prefs.save_to(&path)?;
    println!("Thème {} activé.", label(dark_mode));
    Ok(())
}

pub fn status() {
    let prefs = Preferences::load_from(&config::paths::prefs_path());
    println!("Thème actif: {}", label(prefs.dark_mode));
}
