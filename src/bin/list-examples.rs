use anyhow::{Context, Result};
use wait_demo::Dispatcher;

fn main() -> Result<()> {
    let dispatcher = Dispatcher::builtin().context("failed to build example registry")?;
    let examples: Vec<_> = dispatcher.examples().collect();

    println!("{}", serde_json::to_string_pretty(&examples)?);
    println!("run one with: N=<number> cargo run --bin wait-demo");

    Ok(())
}
