//! Confirmation prompt for actions flagged in the registry

use crate::resource::ConfirmConfig;
use anyhow::Result;
use crossterm::style::Stylize;
use std::io::{self, BufRead, Write};

/// Interpret an answer; empty input takes the default, anything unknown is `None`
pub fn parse_answer(input: &str, default_yes: bool) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "" => Some(default_yes),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Ask on stdin/stderr
pub fn confirm(question: &str, config: &ConfirmConfig, color: bool) -> Result<bool> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    confirm_with(&mut input, &mut io::stderr(), question, config, color)
}

/// Ask until a valid answer arrives; end of input counts as "no"
pub fn confirm_with<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
    config: &ConfirmConfig,
    color: bool,
) -> Result<bool> {
    let hint = if config.default_yes { "[Y/n]" } else { "[y/N]" };
    let prompt = format!("{} {} ", question, hint);
    let prompt = match (color, config.destructive) {
        (true, true) => prompt.red().bold().to_string(),
        (true, false) => prompt.yellow().to_string(),
        (false, _) => prompt,
    };

    loop {
        write!(output, "{}", prompt)?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(false);
        }

        match parse_answer(&line, config.default_yes) {
            Some(answer) => return Ok(answer),
            None => writeln!(output, "Please answer y or n.")?,
        }
    }
}
