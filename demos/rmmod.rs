//! Minimal rmmod over the kmodule library.

use anyhow::bail;
use kmodule::{ModuleManager, RemoveOptions};
use std::env;

fn main() -> anyhow::Result<()> {
    let names: Vec<String> = env::args().skip(1).collect();
    if names.is_empty() {
        bail!("usage: rmmod <module> [module ...]");
    }
    let names: Vec<&str> = names.iter().map(String::as_str).collect();

    ModuleManager::new().remove(&names, &RemoveOptions::default())?;
    Ok(())
}
