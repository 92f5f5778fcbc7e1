//! GitHub-flavored Markdown to terminal text
//!
//! Walks the pulldown-cmark event stream and writes plain lines, optionally
//! decorated with ANSI styles. Tables are laid out with padded columns.

use crossterm::style::{Color, Stylize};
use pulldown_cmark::{Alignment, CodeBlockKind, Event, LinkType, Options, Parser, Tag, TagEnd};
use unicode_width::UnicodeWidthStr;

const RULE_WIDTH: usize = 32;

/// Render `source` for a terminal. With `styled == false` no escape
/// sequences are emitted.
pub fn render_markdown(source: &str, styled: bool) -> String {
    let mut writer = MarkdownWriter::new(styled);
    for event in Parser::new_ext(source, gfm_options()) {
        writer.event(event);
    }
    writer.finish()
}

fn gfm_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
}

#[derive(Debug, Default, Clone, Copy)]
struct InlineStyle {
    strong: usize,
    emphasis: usize,
    strike: usize,
    heading: bool,
    link: bool,
}

#[derive(Debug, Default)]
struct TableBuffer {
    alignments: Vec<Alignment>,
    rows: Vec<Vec<String>>,
    head_rows: usize,
}

struct MarkdownWriter {
    styled: bool,
    out: String,
    at_line_start: bool,
    style: InlineStyle,
    quote_depth: usize,
    in_code_block: bool,
    /// `Some(n)` for ordered lists (next number), `None` for bullets
    lists: Vec<Option<u64>>,
    /// Destinations of open links, shown after the link text
    links: Vec<Option<String>>,
    table: Option<TableBuffer>,
}

impl MarkdownWriter {
    fn new(styled: bool) -> Self {
        Self {
            styled,
            out: String::new(),
            at_line_start: true,
            style: InlineStyle::default(),
            quote_depth: 0,
            in_code_block: false,
            lists: Vec::new(),
            links: Vec::new(),
            table: None,
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) if self.table.is_some() => self.text(&code),
            Event::Code(code) => {
                let painted = self.paint_code(&code);
                self.inline(&painted, &code);
            }
            Event::Html(html) | Event::InlineHtml(html) => self.text(&html),
            Event::InlineMath(math) | Event::DisplayMath(math) => self.text(&math),
            Event::FootnoteReference(label) => self.text(&format!("[^{label}]")),
            Event::SoftBreak | Event::HardBreak => self.newline(),
            Event::Rule => {
                self.block_gap();
                let rule = "─".repeat(RULE_WIDTH);
                let painted = self.paint_dim(&rule);
                self.inline(&painted, &rule);
                self.newline();
            }
            Event::TaskListMarker(checked) => {
                self.text(if checked { "[x] " } else { "[ ] " });
            }
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            // List items already start on a fresh line
            Tag::Paragraph if !self.lists.is_empty() => {}
            Tag::Paragraph => self.block_gap(),
            Tag::Heading { level, .. } => {
                self.block_gap();
                self.style.heading = true;
                let marker = format!("{} ", "#".repeat(level as usize));
                let painted = self.paint(&marker);
                self.inline(&painted, &marker);
            }
            Tag::BlockQuote(_) => {
                self.block_gap();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(kind) => {
                self.block_gap();
                if let CodeBlockKind::Fenced(lang) = kind {
                    if !lang.is_empty() {
                        let label = format!("[{lang}]");
                        let painted = self.paint_dim(&label);
                        self.inline(&painted, &label);
                        self.newline();
                    }
                }
                self.in_code_block = true;
            }
            Tag::List(first) => {
                if self.lists.is_empty() {
                    self.block_gap();
                } else {
                    self.newline();
                }
                self.lists.push(first);
            }
            Tag::Item => {
                self.newline();
                let depth = self.lists.len().saturating_sub(1);
                let bullet = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let bullet = format!("{n}. ");
                        *n += 1;
                        bullet
                    }
                    _ => "• ".to_string(),
                };
                let marker = format!("{}{bullet}", "  ".repeat(depth));
                self.inline(&marker, &marker);
            }
            Tag::Table(alignments) => {
                self.block_gap();
                self.table = Some(TableBuffer {
                    alignments,
                    ..TableBuffer::default()
                });
            }
            Tag::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.rows.push(Vec::new());
                }
            }
            Tag::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    table.rows.push(Vec::new());
                }
            }
            Tag::TableCell => {
                if let Some(row) = self.table.as_mut().and_then(|t| t.rows.last_mut()) {
                    row.push(String::new());
                }
            }
            Tag::Emphasis => self.style.emphasis += 1,
            Tag::Strong => self.style.strong += 1,
            Tag::Strikethrough => self.style.strike += 1,
            Tag::Link {
                link_type,
                dest_url,
                ..
            } => {
                self.style.link = true;
                let shown = !matches!(link_type, LinkType::Autolink | LinkType::Email);
                self.links.push(shown.then(|| dest_url.to_string()));
            }
            Tag::Image { dest_url, .. } => {
                self.text("[image: ");
                self.links.push(Some(dest_url.to_string()));
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.newline(),
            TagEnd::Heading(_) => {
                self.style.heading = false;
                self.newline();
            }
            TagEnd::BlockQuote(_) => {
                self.newline();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.newline();
            }
            TagEnd::List(_) => {
                self.lists.pop();
                self.newline();
            }
            TagEnd::Item => self.newline(),
            TagEnd::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.head_rows = table.rows.len();
                }
            }
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    self.write_table(&table);
                }
            }
            TagEnd::Emphasis => self.style.emphasis = self.style.emphasis.saturating_sub(1),
            TagEnd::Strong => self.style.strong = self.style.strong.saturating_sub(1),
            TagEnd::Strikethrough => self.style.strike = self.style.strike.saturating_sub(1),
            TagEnd::Link => {
                self.style.link = false;
                if let Some(Some(dest)) = self.links.pop() {
                    self.text(&format!(" ({dest})"));
                }
            }
            TagEnd::Image => {
                self.links.pop();
                self.text("]");
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(cell) = self
            .table
            .as_mut()
            .and_then(|t| t.rows.last_mut())
            .and_then(|row| row.last_mut())
        {
            cell.push_str(text);
            return;
        }

        let mut lines = text.split('\n').peekable();
        while let Some(line) = lines.next() {
            if !line.is_empty() {
                let painted = if self.in_code_block {
                    self.paint_code(line)
                } else {
                    self.paint(line)
                };
                self.inline(&painted, line);
            }
            if lines.peek().is_some() {
                self.newline();
            }
        }
    }

    /// Write one already-painted fragment that contains no newline
    fn inline(&mut self, painted: &str, plain: &str) {
        if plain.is_empty() {
            return;
        }
        if self.at_line_start {
            self.write_prefix();
        }
        self.out.push_str(painted);
        self.at_line_start = false;
    }

    fn write_prefix(&mut self) {
        for _ in 0..self.quote_depth {
            let bar = self.paint_dim("│ ");
            self.out.push_str(&bar);
        }
        if self.in_code_block {
            self.out.push_str("    ");
        }
    }

    fn newline(&mut self) {
        if !self.at_line_start {
            self.out.push('\n');
            self.at_line_start = true;
        }
    }

    /// Separate blocks by one blank line
    fn block_gap(&mut self) {
        self.newline();
        if !self.out.is_empty() && !self.out.ends_with("\n\n") && self.lists.is_empty() {
            self.out.push('\n');
        }
    }

    fn write_table(&mut self, table: &TableBuffer) {
        let columns = table.rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut widths = vec![0usize; columns];
        for row in &table.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.width());
            }
        }

        for (r, row) in table.rows.iter().enumerate() {
            let cells: Vec<String> = (0..columns)
                .map(|i| {
                    let cell = row.get(i).map_or("", String::as_str);
                    let align = table.alignments.get(i).copied().unwrap_or(Alignment::None);
                    pad(cell, widths[i], align)
                })
                .collect();
            let line = cells.join(" | ");
            let painted = if r < table.head_rows && self.styled {
                line.as_str().bold().to_string()
            } else {
                line.clone()
            };
            self.inline(&painted, &line);
            self.newline();

            if r + 1 == table.head_rows {
                let sep = widths
                    .iter()
                    .map(|w| "-".repeat(*w))
                    .collect::<Vec<_>>()
                    .join("-+-");
                let painted = self.paint_dim(&sep);
                self.inline(&painted, &sep);
                self.newline();
            }
        }
    }

    fn paint(&self, text: &str) -> String {
        if !self.styled {
            return text.to_string();
        }
        let mut content = text.stylize();
        if self.style.heading {
            content = content.bold().underlined();
        }
        if self.style.strong > 0 {
            content = content.bold();
        }
        if self.style.emphasis > 0 {
            content = content.italic();
        }
        if self.style.strike > 0 {
            content = content.crossed_out();
        }
        if self.style.link {
            content = content.underlined().with(Color::Blue);
        }
        content.to_string()
    }

    fn paint_code(&self, text: &str) -> String {
        if self.styled {
            text.with(Color::Yellow).to_string()
        } else {
            text.to_string()
        }
    }

    fn paint_dim(&self, text: &str) -> String {
        if self.styled {
            text.dim().to_string()
        } else {
            text.to_string()
        }
    }

    fn finish(mut self) -> String {
        while self.out.ends_with('\n') {
            self.out.pop();
        }
        self.out
    }
}

fn pad(cell: &str, width: usize, align: Alignment) -> String {
    let fill = width.saturating_sub(cell.width());
    match align {
        Alignment::Right => format!("{}{cell}", " ".repeat(fill)),
        Alignment::Center => {
            let left = fill / 2;
            format!("{}{cell}{}", " ".repeat(left), " ".repeat(fill - left))
        }
        Alignment::Left | Alignment::None => format!("{cell}{}", " ".repeat(fill)),
    }
}
