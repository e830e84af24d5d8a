//! Interactive choices on the terminal.

use crate::error::{EcceError, Result};
use dialoguer::{Select, theme::ColorfulTheme};
use std::io::{self, IsTerminal};

/// Whether a person is there to answer a selection prompt.
pub fn is_interactive() -> bool {
    io::stdin().is_terminal() && io::stderr().is_terminal()
}

/// Ask the user to pick one of `items`. Returns its index.
pub fn choose(prompt: &str, items: &[String]) -> Result<usize> {
    Select::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .items(items)
        .default(0)
        .interact()
        .map_err(|e| EcceError::UserError(format!("selection aborted: {}", e)))
}
