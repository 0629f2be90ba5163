//! Minimal modinfo over the kmodule library: print every attribute of the
//! given modules, one line per alias and per parameter.

use anyhow::bail;
use kmodule::{DescribeOptions, InfoValue, ModuleManager};
use std::env;

fn main() -> anyhow::Result<()> {
    let names: Vec<String> = env::args().skip(1).collect();
    if names.is_empty() {
        bail!("usage: modinfo <module> [module ...]");
    }
    let names: Vec<&str> = names.iter().map(String::as_str).collect();

    let records = ModuleManager::new().describe(&names, &DescribeOptions::default())?;
    for record in records {
        for (attribute, value) in record.iter() {
            match value {
                InfoValue::Scalar(text) => println!("{:>15}: {}", attribute, text),
                InfoValue::List(values) => {
                    for item in values {
                        println!("{:>15}: {}", attribute, item);
                    }
                }
                InfoValue::Map(pairs) => {
                    for (name, description) in pairs {
                        println!("{:>15}: {:<15}: {}", attribute, name, description);
                    }
                }
            }
        }
    }
    Ok(())
}
