//! Markdown answers as a typed block tree.
//!
//! Covers the subset completion models actually produce: ATX headings, paragraphs,
//! bullet and numbered lists, fenced code, block quotes, thematic breaks, and the
//! inline forms `**strong**`, `*emphasis*`, `` `code` `` and `[text](href)`. Any
//! input parses; unrecognised syntax falls through as text.

use serde::{Deserialize, Serialize};

/// Nesting limit for block quotes; deeper `>` markers are kept as text.
const MAX_QUOTE_DEPTH: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Heading { level: u8, inlines: Vec<Inline> },
    Paragraph { inlines: Vec<Inline> },
    /// `ordered` holds the start number of a numbered list.
    List { ordered: Option<u64>, items: Vec<ListItem> },
    CodeBlock { language: Option<String>, code: String },
    BlockQuote { blocks: Vec<Block> },
    Rule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    /// Nesting level, 0 for top-level items.
    pub depth: usize,
    pub inlines: Vec<Inline>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inline {
    Text { text: String },
    Code { code: String },
    Emphasis { children: Vec<Inline> },
    Strong { children: Vec<Inline> },
    Link { href: String, children: Vec<Inline> },
}

pub fn parse(input: &str) -> Vec<Block> {
    parse_blocks(input, 0)
}

fn parse_blocks(input: &str, quote_depth: usize) -> Vec<Block> {
    let lines: Vec<&str> = input.lines().collect();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let trimmed = line.trim_start();

        if trimmed.is_empty() {
            i += 1;
            continue;
        }

        // Fenced code; an unclosed fence runs to the end of input.
        if let Some(info) = trimmed.strip_prefix("```") {
            let language = Some(info.trim())
                .filter(|l| !l.is_empty())
                .map(str::to_string);
            i += 1;
            let mut code = Vec::new();
            while i < lines.len() && !lines[i].trim_start().starts_with("```") {
                code.push(lines[i]);
                i += 1;
            }
            i += 1;
            blocks.push(Block::CodeBlock {
                language,
                code: code.join("\n"),
            });
            continue;
        }

        if is_rule(trimmed) {
            blocks.push(Block::Rule);
            i += 1;
            continue;
        }

        if let Some((level, text)) = heading(trimmed) {
            blocks.push(Block::Heading {
                level,
                inlines: parse_inlines(text),
            });
            i += 1;
            continue;
        }

        if trimmed.starts_with('>') && quote_depth < MAX_QUOTE_DEPTH {
            let mut quoted = Vec::new();
            while i < lines.len() {
                let Some(rest) = lines[i].trim_start().strip_prefix('>') else {
                    break;
                };
                quoted.push(rest.strip_prefix(' ').unwrap_or(rest));
                i += 1;
            }
            blocks.push(Block::BlockQuote {
                blocks: parse_blocks(&quoted.join("\n"), quote_depth + 1),
            });
            continue;
        }

        if let Some(first) = list_marker(line) {
            let ordered = first.ordered;
            let mut items: Vec<(usize, String)> = Vec::new();
            while i < lines.len() {
                let current = lines[i];
                if current.trim().is_empty() {
                    break;
                }
                match list_marker(current) {
                    Some(marker) if marker.ordered.is_some() == ordered.is_some() => {
                        items.push((marker.depth, marker.text.to_string()));
                    }
                    Some(_) => break,
                    None if starts_block(current) => break,
                    // Lazy continuation of the previous item.
                    None => {
                        if let Some((_, text)) = items.last_mut() {
                            text.push(' ');
                            text.push_str(current.trim());
                        }
                    }
                }
                i += 1;
            }
            blocks.push(Block::List {
                ordered,
                items: items
                    .into_iter()
                    .map(|(depth, text)| ListItem {
                        depth,
                        inlines: parse_inlines(&text),
                    })
                    .collect(),
            });
            continue;
        }

        let mut paragraph = vec![trimmed.trim_end()];
        i += 1;
        while i < lines.len() && !lines[i].trim().is_empty() && !starts_block(lines[i]) {
            paragraph.push(lines[i].trim());
            i += 1;
        }
        blocks.push(Block::Paragraph {
            inlines: parse_inlines(&paragraph.join(" ")),
        });
    }

    blocks
}

fn starts_block(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```")
        || trimmed.starts_with('>')
        || is_rule(trimmed)
        || heading(trimmed).is_some()
        || list_marker(line).is_some()
}

/// `---`, `***` or `___`, optionally spaced.
fn is_rule(trimmed: &str) -> bool {
    let mut marks = trimmed.chars().filter(|c| !c.is_whitespace());
    let Some(first) = marks.next() else {
        return false;
    };
    if !matches!(first, '-' | '*' | '_') {
        return false;
    }
    let mut count = 1;
    for c in marks {
        if c != first {
            return false;
        }
        count += 1;
    }
    count >= 3
}

fn heading(trimmed: &str) -> Option<(u8, &str)> {
    let level = trimmed.chars().take_while(|&c| c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.is_empty() && !rest.starts_with(' ') {
        return None;
    }
    Some((level as u8, rest.trim().trim_end_matches('#').trim_end()))
}

struct ListMarker<'a> {
    depth: usize,
    ordered: Option<u64>,
    text: &'a str,
}

fn list_marker(line: &str) -> Option<ListMarker<'_>> {
    let indent: usize = line
        .chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum();
    let depth = indent / 2;
    let rest = line.trim_start();

    for bullet in ["- ", "* ", "+ "] {
        if let Some(text) = rest.strip_prefix(bullet) {
            return Some(ListMarker {
                depth,
                ordered: None,
                text: text.trim(),
            });
        }
    }

    let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 || digits > 9 {
        return None;
    }
    let after = &rest[digits..];
    let text = after
        .strip_prefix(". ")
        .or_else(|| after.strip_prefix(") "))?;
    let start = rest[..digits].parse().ok()?;
    Some(ListMarker {
        depth,
        ordered: Some(start),
        text: text.trim(),
    })
}

pub fn parse_inlines(text: &str) -> Vec<Inline> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '`' => {
                if let Some(end) = find(&chars, i + 1, &['`']) {
                    flush(&mut buf, &mut out);
                    out.push(Inline::Code {
                        code: collect(&chars[i + 1..end]),
                    });
                    i = end + 1;
                    continue;
                }
            }
            '*' | '_' if c == '*' || i == 0 || !chars[i - 1].is_alphanumeric() => {
                if chars.get(i + 1) == Some(&c) {
                    if let Some(end) = find(&chars, i + 2, &[c, c]) {
                        if end > i + 2 {
                            flush(&mut buf, &mut out);
                            out.push(Inline::Strong {
                                children: parse_inlines(&collect(&chars[i + 2..end])),
                            });
                            i = end + 2;
                            continue;
                        }
                    }
                } else if let Some(end) = find(&chars, i + 1, &[c]) {
                    if end > i + 1 {
                        flush(&mut buf, &mut out);
                        out.push(Inline::Emphasis {
                            children: parse_inlines(&collect(&chars[i + 1..end])),
                        });
                        i = end + 1;
                        continue;
                    }
                }
            }
            '[' => {
                if let Some(close) = find(&chars, i + 1, &[']', '(']) {
                    if let Some(paren) = find(&chars, close + 2, &[')']) {
                        flush(&mut buf, &mut out);
                        out.push(Inline::Link {
                            href: collect(&chars[close + 2..paren]).trim().to_string(),
                            children: parse_inlines(&collect(&chars[i + 1..close])),
                        });
                        i = paren + 1;
                        continue;
                    }
                }
            }
            _ => {}
        }
        buf.push(c);
        i += 1;
    }

    flush(&mut buf, &mut out);
    out
}

/// Index of the first occurrence of `pattern` at or after `from`.
fn find(chars: &[char], from: usize, pattern: &[char]) -> Option<usize> {
    if from > chars.len() {
        return None;
    }
    chars[from..]
        .windows(pattern.len())
        .position(|w| w == pattern)
        .map(|p| p + from)
}

fn collect(chars: &[char]) -> String {
    chars.iter().collect()
}

fn flush(buf: &mut String, out: &mut Vec<Inline>) {
    if !buf.is_empty() {
        out.push(Inline::Text {
            text: std::mem::take(buf),
        });
    }
}
