//! Terminal rendering of the problem banner and the agent's answers

use std::io::{self, IsTerminal};

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::conversation::Conversation;

// ANSI colors
const GREEN: &str = "\x1b[92m";
const MAGENTA: &str = "\x1b[95m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Widest panel body before lines are wrapped
const MAX_WIDTH: usize = 96;

const BANNER_TITLE: &str = concat!("Xiaomei (Ver ", env!("CARGO_PKG_VERSION"), ")");
const ANSWER_TITLE: &str = "Yangmei's analysis";

/// Draws boxed panels, optionally colored
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Color only when stdout is a terminal and `NO_COLOR` is unset
    pub fn detect() -> Self {
        Self::new(io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none())
    }

    /// Banner showing the problem being solved
    pub fn problem(&self, question: &str, task: &str) -> String {
        let body = format!(
            "# Today's CTF problem!!\n\n- Problem\n```\n{}\n```\n- Task\n```\n{}\n```",
            question.trim_end(),
            task.trim_end()
        );
        self.panel(BANNER_TITLE, &body, MAGENTA)
    }

    /// One panel per assistant reply
    pub fn answers(&self, conversation: &Conversation) -> String {
        conversation
            .assistant_messages()
            .filter(|m| !m.content.trim().is_empty())
            .map(|m| self.panel(ANSWER_TITLE, m.content.trim_end(), GREEN))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn panel(&self, title: &str, body: &str, color: &str) -> String {
        let lines: Vec<String> = body.lines().flat_map(wrap_line).collect();
        let width = lines
            .iter()
            .map(|l| l.width())
            .chain(std::iter::once(title.width() + 2))
            .max()
            .unwrap_or(0);

        let (start, bold, end) = if self.color {
            (color, BOLD, RESET)
        } else {
            ("", "", "")
        };

        let title_pad = width - title.width();
        let left = title_pad / 2;
        let right = title_pad - left;

        let mut out = String::new();
        out.push_str(&format!(
            "{start}╭{} {bold}{title}{end}{start} {}╮{end}\n",
            "─".repeat(left),
            "─".repeat(right)
        ));
        for line in &lines {
            let pad = width - line.width();
            out.push_str(&format!("{start}│{end} {line}{} {start}│{end}\n", " ".repeat(pad)));
        }
        out.push_str(&format!("{start}╰{}╯{end}\n", "─".repeat(width + 2)));
        out
    }
}

/// Split a line into chunks at most `MAX_WIDTH` terminal columns wide
fn wrap_line(line: &str) -> Vec<String> {
    let line = line.replace('\t', "    ");
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;

    for c in line.chars() {
        let w = c.width().unwrap_or(0);
        if current_width + w > MAX_WIDTH && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_width = 0;
        }
        current.push(c);
        current_width += w;
    }
    chunks.push(current);
    chunks
}
