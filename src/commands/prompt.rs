//! Interactive selection and confirmation

use crate::error::{Result, SupportError};
use std::io::{BufRead, Write};

/// Synchronous request/response interaction with the operator
pub trait Prompter {
    /// Choose one of `options`, returning its index
    fn select(&self, title: &str, options: &[String]) -> Result<usize>;

    /// Ask a yes/no question
    fn confirm(&self, question: &str) -> Result<bool>;
}

/// Prompts on stdout and reads answers from stdin
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn select(&self, title: &str, options: &[String]) -> Result<usize> {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        select_from(&mut stdin.lock(), &mut stdout.lock(), title, options)
    }

    fn confirm(&self, question: &str) -> Result<bool> {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        confirm_from(&mut stdin.lock(), &mut stdout.lock(), question)
    }
}

fn read_answer(input: &mut impl BufRead) -> Result<String> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(SupportError::Cancelled);
    }
    Ok(line.trim().to_string())
}

/// List `options` numbered from 1 and re-ask until a valid number is entered
pub fn select_from(
    input: &mut impl BufRead,
    output: &mut impl Write,
    title: &str,
    options: &[String],
) -> Result<usize> {
    if options.is_empty() {
        return Err(SupportError::InvalidArgument(format!("nothing to choose for: {title}")));
    }

    for (i, option) in options.iter().enumerate() {
        writeln!(output, "{}. {}", i + 1, option)?;
    }

    loop {
        write!(output, "\n{title} (Number): ")?;
        output.flush()?;

        match read_answer(input)?.parse::<usize>() {
            Ok(n) if (1..=options.len()).contains(&n) => return Ok(n - 1),
            _ => writeln!(
                output,
                "Invalid selection. Please enter a number between 1 and {}.",
                options.len()
            )?,
        }
    }
}

/// Ask `question` until the answer is yes or no
pub fn confirm_from(input: &mut impl BufRead, output: &mut impl Write, question: &str) -> Result<bool> {
    loop {
        write!(output, "{question} (y/n): ")?;
        output.flush()?;

        match read_answer(input)?.to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => writeln!(output, "Please answer y or n.")?,
        }
    }
}
