//! Presentation of notes.
//!
//! Titles are always treated as text and content HTML is never passed through
//! unchecked: the terminal view reduces it to plain text, and the HTML view
//! runs it through an allow-list sanitizer.

use std::fmt::Write as _;

use chrono::Local;
use console::Style;
use rand::seq::IndexedRandom;

use crate::{Note, Theme};

pub const QUOTES: [&str; 5] = [
    "Believe you can and you're halfway there.",
    "Little progress each day adds up to big results.",
    "Your future is created by what you do today.",
    "Start where you are. Use what you have. Do what you can.",
    "Discipline is choosing what you want most over what you want now.",
];

pub const EMPTY_STATE: &str = "No notes yet. Run `diary new` to start journaling ✨";

/// Formatting-only tags the editor produces.
const ALLOWED_TAGS: &[&str] = &[
    "p", "br", "strong", "b", "em", "i", "u", "s", "h1", "h2", "h3", "ol", "ul", "li", "a",
    "blockquote", "code", "pre", "span",
];

/// Tags whose whole body is dropped, not just the markup.
const DROPPED_BODIES: &[&str] = &["script", "style", "iframe", "object", "template"];

/// Tags that start a new line in the plain-text view.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "li", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre", "ul", "ol",
];

const SAFE_SCHEMES: &[&str] = &["http://", "https://", "mailto:"];

pub fn random_quote() -> &'static str {
    QUOTES.choose(&mut rand::rng()).copied().unwrap_or(QUOTES[0])
}

/// Title line for the signed-in user.
pub fn header(name: &str) -> String {
    format!("📔 {}'s Diary", name)
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Text(&'a str),
    Tag {
        name: String,
        closing: bool,
        body: &'a str,
    },
    Comment,
}

fn tokenize(html: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut rest = html;

    while !rest.is_empty() {
        let Some(start) = rest.find('<') else {
            tokens.push(Token::Text(rest));
            break;
        };
        if start > 0 {
            tokens.push(Token::Text(&rest[..start]));
        }
        let after = &rest[start..];

        if let Some(comment) = after.strip_prefix("<!--") {
            rest = match comment.find("-->") {
                Some(end) => &comment[end + 3..],
                None => "",
            };
            tokens.push(Token::Comment);
            continue;
        }

        let Some(end) = after.find('>') else {
            // A lone '<' with nothing closing it is text.
            tokens.push(Token::Text(after));
            break;
        };

        let inner = &after[1..end];
        let (closing, inner) = match inner.strip_prefix('/') {
            Some(stripped) => (true, stripped),
            None => (false, inner),
        };

        // A tag name has to start with a letter; `<3` or `< 2` is text.
        if !inner.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
            tokens.push(Token::Text(&after[..1]));
            rest = &after[1..];
            continue;
        }

        let name: String = inner
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        tokens.push(Token::Tag {
            body: &inner[name.len()..],
            name,
            closing,
        });
        rest = &after[end + 1..];
    }

    tokens
}

/// Value of `attr` inside a tag body such as ` href="x" target=_blank`.
fn attr_value<'a>(body: &'a str, attr: &str) -> Option<&'a str> {
    let lower = body.to_ascii_lowercase();
    let mut from = 0;
    while let Some(pos) = lower[from..].find(attr) {
        let at = from + pos;
        from = at + attr.len();
        let preceded_by_space = at == 0
            || lower[..at]
                .chars()
                .last()
                .is_some_and(|c| c.is_ascii_whitespace());
        let rest = body[from..].trim_start();
        if !preceded_by_space || !rest.starts_with('=') {
            continue;
        }
        let value = rest[1..].trim_start();
        return match value.chars().next() {
            Some(q @ ('"' | '\'')) => value[1..].split(q).next(),
            Some(_) => value.split(|c: char| c.is_ascii_whitespace()).next(),
            None => None,
        };
    }
    None
}

fn is_safe_href(href: &str) -> bool {
    let lower = href.trim().to_ascii_lowercase();
    SAFE_SCHEMES.iter().any(|scheme| lower.starts_with(scheme))
}

/// Escapes text that might still contain markup characters, keeping entity
/// references the editor already produced.
fn push_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

/// Keeps the editor's formatting tags without attributes (links keep a safe
/// `href`), drops script-like elements with their content, and strips every
/// other tag.
pub fn sanitize_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut skipping: Option<String> = None;

    for token in tokenize(html) {
        if let Some(skipped) = &skipping {
            if let Token::Tag {
                name, closing: true, ..
            } = &token
            {
                if name == skipped {
                    skipping = None;
                }
            }
            continue;
        }

        match token {
            Token::Text(text) => push_text(&mut out, text),
            Token::Comment => {}
            Token::Tag { name, closing, body } => {
                if DROPPED_BODIES.contains(&name.as_str()) {
                    if !closing && !body.trim_end().ends_with('/') {
                        skipping = Some(name);
                    }
                    continue;
                }
                if !ALLOWED_TAGS.contains(&name.as_str()) {
                    continue;
                }
                if closing {
                    if name != "br" {
                        let _ = write!(out, "</{}>", name);
                    }
                } else if name == "a" {
                    match attr_value(body, "href").filter(|href| is_safe_href(href)) {
                        Some(href) => {
                            let _ = write!(
                                out,
                                "<a href=\"{}\" rel=\"noopener noreferrer\">",
                                escape_html(href)
                            );
                        }
                        None => out.push_str("<a>"),
                    }
                } else {
                    let _ = write!(out, "<{}>", name);
                }
            }
        }
    }

    out
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Plain-text rendering of editor HTML for the terminal.
pub fn html_to_text(html: &str) -> String {
    let mut out = String::new();
    let mut skipping: Option<String> = None;

    for token in tokenize(html) {
        if let Some(skipped) = &skipping {
            if matches!(&token, Token::Tag { name, closing: true, .. } if name == skipped) {
                skipping = None;
            }
            continue;
        }
        match token {
            Token::Text(text) => out.push_str(&decode_entities(text)),
            Token::Comment => {}
            Token::Tag { name, closing, body } => {
                if DROPPED_BODIES.contains(&name.as_str()) {
                    if !closing && !body.trim_end().ends_with('/') {
                        skipping = Some(name);
                    }
                    continue;
                } else if name == "br" {
                    out.push('\n');
                } else if BLOCK_TAGS.contains(&name.as_str()) && !out.ends_with('\n') {
                    out.push('\n');
                }
                if name == "li" && !closing {
                    out.push_str("- ");
                }
            }
        }
    }

    let lines: Vec<&str> = out.lines().map(str::trim_end).collect();
    let mut text = String::new();
    let mut blank_run = 0;
    for line in lines {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        text.push_str(line);
        text.push('\n');
    }
    text.trim().to_string()
}

/// Terminal styles for a theme.
#[derive(Debug, Clone)]
pub struct Palette {
    pub title: Style,
    pub tag: Style,
    pub muted: Style,
    pub accent: Style,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                title: Style::new().bold().blue(),
                tag: Style::new().magenta(),
                muted: Style::new().dim(),
                accent: Style::new().italic().magenta(),
            },
            Theme::Dark => Self {
                title: Style::new().bold().cyan(),
                tag: Style::new().color256(213),
                muted: Style::new().white().dim(),
                accent: Style::new().italic().color256(219),
            },
        }
    }
}

/// One note as a terminal card.
pub fn render_card(note: &Note, palette: &Palette, width: usize) -> String {
    let mut out = String::new();
    let rule = "─".repeat(width.clamp(10, 80));

    let _ = writeln!(out, "{}", palette.muted.apply_to(&rule));
    let _ = writeln!(
        out,
        "{}  {}",
        palette.title.apply_to(&note.title),
        palette.muted.apply_to(&note.id)
    );

    let body = html_to_text(&note.content);
    if !body.is_empty() {
        let _ = writeln!(out, "{}", body);
    }

    if !note.tags.is_empty() {
        let chips: Vec<String> = note
            .tags
            .iter()
            .map(|t| palette.tag.apply_to(format!("#{}", t)).to_string())
            .collect();
        let _ = writeln!(out, "{}", chips.join(" "));
    }

    let updated = note.updated_at.with_timezone(&Local);
    let _ = write!(
        out,
        "{}",
        palette
            .muted
            .apply_to(updated.format("%Y-%m-%d %H:%M").to_string())
    );
    out
}

/// One line per note: id, title and tags.
pub fn render_brief(note: &Note, palette: &Palette) -> String {
    let tags: Vec<String> = note.tags.iter().map(|t| format!("#{}", t)).collect();
    format!(
        "{}  {}  {}",
        palette.muted.apply_to(&note.id),
        palette.title.apply_to(&note.title),
        palette.tag.apply_to(tags.join(" "))
    )
}

/// One note as a sanitized HTML fragment.
pub fn render_html_card(note: &Note) -> String {
    let mut out = String::new();
    let _ = write!(out, "<article class=\"note\" data-id=\"{}\">", escape_html(&note.id));
    let _ = write!(out, "<h3>{}</h3>", escape_html(&note.title));
    let _ = write!(
        out,
        "<div class=\"content\">{}</div>",
        sanitize_html(&note.content)
    );
    if !note.tags.is_empty() {
        out.push_str("<div class=\"tags\">");
        for tag in &note.tags {
            let _ = write!(out, "<span class=\"tag\">#{}</span>", escape_html(tag));
        }
        out.push_str("</div>");
    }
    let _ = write!(
        out,
        "<time datetime=\"{}\">{}</time></article>",
        note.updated_at.to_rfc3339(),
        note.updated_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
    );
    out
}
