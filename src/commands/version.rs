use anyhow::Result;

pub fn execute() -> Result<()> {
    println!("devmon version {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
