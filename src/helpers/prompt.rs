use std::io::{self, Write};

use anyhow::Result;

/// Reads one line from stdin, used to fill in missing config fields.
pub fn prompt(label: &str) -> Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
