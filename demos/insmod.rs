//! Minimal insmod over the kmodule library: load one module image with
//! `name=value` parameters. Integer-looking values become integers,
//! comma-separated values become lists, everything else stays a string.

use anyhow::{bail, Context};
use kmodule::{ModuleManager, ParamItem, ParamValue, ParameterSet};
use std::env;

fn parse_value(text: &str) -> ParamValue {
    if let Ok(number) = text.parse::<i64>() {
        return ParamValue::Int(number);
    }
    if text.contains(',') {
        let items = text
            .split(',')
            .map(|element| match element.parse::<i64>() {
                Ok(number) => ParamItem::Int(number),
                Err(_) => ParamItem::Str(element.to_string()),
            })
            .collect();
        return ParamValue::List(items);
    }
    ParamValue::Str(text.to_string())
}

fn main() -> anyhow::Result<()> {
    let mut args = env::args().skip(1);
    let path = match args.next() {
        Some(path) => path,
        None => bail!("usage: insmod <module.ko> [name=value ...]"),
    };

    let mut params = ParameterSet::new();
    for arg in args {
        let (name, value) = arg
            .split_once('=')
            .with_context(|| format!("parameter {:?} is not name=value", arg))?;
        params.insert(name, parse_value(value));
    }

    ModuleManager::new().insert(&path, &params)?;
    Ok(())
}
