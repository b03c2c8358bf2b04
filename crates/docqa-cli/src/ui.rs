//! UI utilities for the interactive loop

use colored::*;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, size},
};
use std::io::{self, IsTerminal, Write};

use docqa_core::{Intent, Result, Retrieval};

use crate::assistant::{Outcome, Response};

/// Words that end the loop, compared case-insensitively
pub const EXIT_COMMANDS: [&str; 3] = ["sair", "exit", "quit"];

pub fn is_exit_command(input: &str) -> bool {
    let input = input.trim();
    EXIT_COMMANDS
        .iter()
        .any(|command| input.eq_ignore_ascii_case(command))
}

/// Display startup banner
pub fn display_banner(title: &str, subtitle: &str) {
    let terminal_width = size().map(|(w, _)| w as usize).unwrap_or(80);
    let banner_width = std::cmp::min(67, terminal_width.saturating_sub(4)).max(40);

    let top_border = format!("┌{}┐", "─".repeat(banner_width - 2));
    let bottom_border = format!("└{}┘", "─".repeat(banner_width - 2));
    let empty_line = format!("│{}│", " ".repeat(banner_width - 2));
    let padded = |text: &str| {
        let width = text.chars().count();
        format!("│  {}{}│", text, " ".repeat(banner_width.saturating_sub(width + 4)))
    };

    println!();
    println!("{}", top_border.blue());
    println!("{}", empty_line.blue());
    println!("{}", padded(title).blue().bold());
    println!("{}", padded(subtitle).blue());
    println!("{}", empty_line.blue());

    let feature_lines = [
        "Ask about the indexed documents, do quick maths, or just chat.",
        "",
        "Routes:",
        "• document_search  answers grounded in your PDFs",
        "• calculation      arithmetic via a safe evaluator",
        "• general          plain conversation",
        "",
        "History with ↑/↓ • Esc clears the line",
    ];

    for line in feature_lines {
        if line.is_empty() {
            println!("{}", empty_line.blue());
        } else {
            println!("{}", padded(line).blue());
        }
    }

    println!("{}", empty_line.blue());
    println!("{}", bottom_border.blue());
    println!();
    println!(
        "{}",
        format!("Tip: type '{}' to leave", EXIT_COMMANDS.join("', '")).dimmed()
    );
    println!();
}

/// Read one line, with history navigation when stdin is a terminal.
///
/// Returns `None` at end of input or on Ctrl+C / Ctrl+D.
pub fn read_question(prompt: &str, history: &mut Vec<String>) -> Result<Option<String>> {
    if !io::stdin().is_terminal() {
        print!("{} ", prompt.green().bold());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(None);
        }
        let input = input.trim().to_string();
        if !input.is_empty() {
            history.push(input.clone());
        }
        return Ok(Some(input));
    }

    enable_raw_mode()?;
    let result = edit_line(prompt, history);
    disable_raw_mode()?;
    println!();

    let input = result?;
    if let Some(line) = &input {
        if !line.trim().is_empty() {
            history.push(line.clone());
        }
    }
    Ok(input)
}

fn redraw(prompt: &str, input: &str, previous_width: usize) -> Result<()> {
    let clear = " ".repeat(previous_width);
    print!("\r{} {}\r{} {}", prompt.green().bold(), clear, prompt.green().bold(), input);
    io::stdout().flush()?;
    Ok(())
}

fn edit_line(prompt: &str, history: &[String]) -> Result<Option<String>> {
    let mut input = String::new();
    let mut history_index: Option<usize> = None;

    print!("{} ", prompt.green().bold());
    io::stdout().flush()?;

    loop {
        let Event::Key(key_event) = event::read()? else {
            continue;
        };
        if key_event.kind != KeyEventKind::Press {
            continue;
        }

        let previous_width = input.chars().count();
        match key_event.code {
            KeyCode::Enter => return Ok(Some(input)),
            KeyCode::Char('c') | KeyCode::Char('d')
                if key_event.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                return Ok(None);
            }
            KeyCode::Char(c) => {
                input.push(c);
                redraw(prompt, &input, previous_width)?;
            }
            KeyCode::Backspace => {
                if input.pop().is_some() {
                    redraw(prompt, &input, previous_width)?;
                }
            }
            KeyCode::Up => {
                if !history.is_empty() {
                    let new_index = match history_index {
                        None => history.len() - 1,
                        Some(idx) if idx > 0 => idx - 1,
                        Some(idx) => idx,
                    };
                    history_index = Some(new_index);
                    input = history[new_index].clone();
                    redraw(prompt, &input, previous_width)?;
                }
            }
            KeyCode::Down => {
                if let Some(idx) = history_index {
                    if idx + 1 < history.len() {
                        history_index = Some(idx + 1);
                        input = history[idx + 1].clone();
                    } else {
                        history_index = None;
                        input.clear();
                    }
                    redraw(prompt, &input, previous_width)?;
                }
            }
            KeyCode::Esc => {
                history_index = None;
                input.clear();
                redraw(prompt, &input, previous_width)?;
            }
            _ => {}
        }
    }
}

/// Route banner printed before a handler runs
pub fn print_route(intent: Intent) {
    let label = match intent {
        Intent::DocumentSearch => "Routed to: document search",
        Intent::Calculation => "Routed to: calculator",
        Intent::General => "Routed to: general answer",
    };
    println!("\n{}", format!("--- {} ---", label).cyan());
}

/// Query variants and selected passages, best first
pub fn print_diagnostics(retrieval: &Retrieval) {
    println!("{}", "Queries used for search:".bold());
    for (i, variant) in retrieval.variants.iter().enumerate() {
        println!("  {}. {}", i + 1, variant);
    }

    println!(
        "\n{}",
        format!(
            "--- {} unique passages retrieved, {} selected ---",
            retrieval.candidates,
            retrieval.passages.len()
        )
        .bold()
    );
    for (i, scored) in retrieval.passages.iter().enumerate() {
        println!(
            "{} {} {}",
            format!("[{}]", i + 1).yellow(),
            scored.passage.citation().dimmed(),
            format!("(score {:.3})", scored.score).dimmed()
        );
        println!("{}\n", scored.passage.content.trim());
    }
}

pub fn print_answer(response: &Response) {
    if let Outcome::Calculation(calculation) = &response.outcome {
        println!("{} {}", "Expression:".dimmed(), calculation.expression);
    }

    println!("\n{}", "Final answer:".green().bold());
    println!("{}", response.text());
}

pub fn print_error(error: &dyn std::fmt::Display) {
    eprintln!("{} {}", "Error:".red().bold(), error);
}
