//! Minimal lsmod over the kmodule library: format the current module
//! table snapshot.

use kmodule::ModuleManager;

fn main() -> anyhow::Result<()> {
    let manager = ModuleManager::new();
    let table = manager.list()?;

    let mut modules: Vec<_> = table.values().collect();
    modules.sort_by(|a, b| a.name.cmp(&b.name));

    for module in modules {
        println!("{}", module);
    }
    Ok(())
}
