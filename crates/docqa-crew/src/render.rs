//! Terminal rendering of Markdown answers

use colored::*;
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};

/// Render Markdown to styled terminal text
pub fn render_markdown(markdown: &str) -> String {
    let mut out = String::new();
    let mut line = String::new();
    let mut heading: Option<HeadingLevel> = None;
    let mut strong = false;
    let mut emphasis = false;
    let mut list_depth: usize = 0;
    let mut ordered: Vec<Option<u64>> = Vec::new();

    let flush = |out: &mut String, line: &mut String| {
        if !line.is_empty() {
            out.push_str(line.trim_end());
            out.push('\n');
            line.clear();
        }
    };

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                flush(&mut out, &mut line);
                if !out.is_empty() {
                    out.push('\n');
                }
                heading = Some(level);
            }
            Event::End(TagEnd::Heading(_)) => {
                flush(&mut out, &mut line);
                heading = None;
            }
            Event::Start(Tag::List(start)) => {
                flush(&mut out, &mut line);
                list_depth += 1;
                ordered.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                list_depth = list_depth.saturating_sub(1);
                ordered.pop();
            }
            Event::Start(Tag::Item) => {
                flush(&mut out, &mut line);
                let indent = "  ".repeat(list_depth.saturating_sub(1));
                let marker = match ordered.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{}.", n);
                        *n += 1;
                        marker
                    }
                    _ => "•".to_string(),
                };
                line.push_str(&format!("{}{} ", indent, marker));
            }
            Event::End(TagEnd::Item) => flush(&mut out, &mut line),
            Event::End(TagEnd::Paragraph) => {
                flush(&mut out, &mut line);
                if list_depth == 0 {
                    out.push('\n');
                }
            }
            Event::Start(Tag::Strong) => strong = true,
            Event::End(TagEnd::Strong) => strong = false,
            Event::Start(Tag::Emphasis) => emphasis = true,
            Event::End(TagEnd::Emphasis) => emphasis = false,
            Event::Text(text) | Event::Code(text) => {
                let styled = match heading {
                    Some(HeadingLevel::H1) => text.bold().underline().to_string(),
                    Some(_) => text.bold().cyan().to_string(),
                    None if strong => text.bold().to_string(),
                    None if emphasis => text.italic().to_string(),
                    None => text.to_string(),
                };
                line.push_str(&styled);
            }
            Event::SoftBreak => line.push(' '),
            Event::HardBreak => flush(&mut out, &mut line),
            Event::Rule => {
                flush(&mut out, &mut line);
                out.push_str(&"─".repeat(40));
                out.push('\n');
            }
            _ => {}
        }
    }

    flush(&mut out, &mut line);
    out.trim_end().to_string()
}
