//! JSON mod/bookmark ingestion and world construction.

use anyhow::{bail, Context, Result};
use std::path::Path;
use vicdata::{Bookmark, ModData};
use vicsim_core::{Definitions, SimConfig, World};

pub fn load_mod_data(path: &Path) -> Result<ModData> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading mod data from {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing mod data {}", path.display()))
}

pub fn load_bookmark(path: &Path) -> Result<Bookmark> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading bookmark from {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing bookmark {}", path.display()))
}

/// Build registries and the starting world. Any load error is fatal.
pub fn build_world(
    data: &ModData,
    bookmark: &Bookmark,
    config: SimConfig,
    seed: u64,
) -> Result<World> {
    let defs = match Definitions::from_mod_data(data) {
        Ok(defs) => defs,
        Err(errors) => bail!("mod data failed to load: {errors}"),
    };
    match World::from_bookmark(defs, config, bookmark, seed) {
        Ok(world) => Ok(world),
        Err(errors) => bail!("bookmark failed to build: {errors}"),
    }
}
