//! Line-oriented prompts on stdin/stdout.

use std::io::{self, Write};

use anyhow::Result;

fn read_line(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

pub fn required(label: &str) -> Result<String> {
    read_line(&format!("{}: ", label))
}

/// Prompt showing the current value; an empty answer keeps it
pub fn with_default(label: &str, current: &str) -> Result<String> {
    if current.is_empty() {
        return required(label);
    }
    let input = read_line(&format!("{} [{}]: ", label, current))?;
    Ok(if input.is_empty() {
        current.to_string()
    } else {
        input
    })
}

/// Prompt for an optional field; an empty answer means not provided
pub fn optional(label: &str) -> Result<Option<String>> {
    let input = read_line(&format!("{} (optional): ", label))?;
    Ok(Some(input).filter(|s| !s.is_empty()))
}

pub fn password(label: &str) -> Result<String> {
    let password = rpassword::prompt_password(format!("{}: ", label))?;
    Ok(password)
}
