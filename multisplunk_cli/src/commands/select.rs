//! Interactive instance picker.

use crate::commands::{CommandError, Result};
use crate::output::paint;
use multisplunk_core::EndpointDescriptor;
use owo_colors::Style;
use std::io::{self, BufRead, Write};

/// Ask which instances to query. `None` means all of them.
pub fn prompt(instances: &[EndpointDescriptor]) -> Result<Option<Vec<String>>> {
    println!("{}", paint("Available instances:", Style::new().bold()));
    for (idx, instance) in instances.iter().enumerate() {
        println!(
            "  {}. {} {}",
            idx + 1,
            instance.name,
            paint(format!("({})", instance.host), Style::new().dimmed())
        );
    }
    print!("Select instances (comma-separated numbers, blank for all): ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;

    Ok(parse_indices(&input, instances.len())?.map(|indices| {
        indices
            .into_iter()
            .map(|i| instances[i].name.clone())
            .collect()
    }))
}

/// Turn `"1, 3"` into zero-based indices.
///
/// Blank input selects everything (`None`). Out-of-range numbers are
/// skipped; anything that is not a number is an error.
pub fn parse_indices(input: &str, count: usize) -> Result<Option<Vec<usize>>> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    let mut picked = Vec::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let number: usize = part
            .parse()
            .map_err(|_| CommandError::InvalidSelection(part.to_string()))?;
        if (1..=count).contains(&number) && !picked.contains(&(number - 1)) {
            picked.push(number - 1);
        }
    }
    Ok(Some(picked))
}
