//! Markdown rendering with comrak.

use comrak::nodes::{AstNode, ListDelimType, ListType, NodeValue, TableAlignment};
use comrak::{Arena, Options, parse_document};
use unicode_width::UnicodeWidthStr;

use super::types::{Document, InlineSpan, InlineStyle, LineType, RenderedLine};
use crate::sync::RenderError;

/// Bounds applied before a document is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderLimits {
    /// Largest source accepted, in bytes.
    pub max_source_bytes: usize,
    /// Deepest syntax tree accepted.
    pub max_nesting: usize,
}

impl Default for RenderLimits {
    fn default() -> Self {
        Self {
            max_source_bytes: 8 * 1024 * 1024,
            max_nesting: 96,
        }
    }
}

/// Render markdown source into a Document wrapped to `width` columns.
///
/// # Errors
///
/// Returns [`RenderError::TooLarge`] or [`RenderError::NestingTooDeep`] when
/// the source exceeds `limits`.
pub fn render_markdown(
    source: &str,
    width: u16,
    limits: RenderLimits,
) -> Result<Document, RenderError> {
    if source.len() > limits.max_source_bytes {
        return Err(RenderError::TooLarge {
            size: source.len(),
            limit: limits.max_source_bytes,
        });
    }

    let mut options = Options::default();
    // GFM extensions
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;

    let arena = Arena::new();
    let root = parse_document(&arena, source, &options);

    let depth = tree_depth(root, limits.max_nesting);
    if depth > limits.max_nesting {
        return Err(RenderError::NestingTooDeep {
            depth,
            limit: limits.max_nesting,
        });
    }

    let mut lines = Vec::new();
    let wrap_width = usize::from(width.max(8));
    process_node(root, &mut lines, 0, wrap_width, None);

    while matches!(lines.last().map(RenderedLine::line_type), Some(LineType::Empty)) {
        lines.pop();
    }

    Ok(Document::new(source.to_string(), lines))
}

/// Depth of the deepest node, counting stops once `limit` is exceeded.
fn tree_depth<'a>(root: &'a AstNode<'a>, limit: usize) -> usize {
    let mut deepest = 0;
    let mut stack = vec![(root, 0usize)];
    while let Some((node, depth)) = stack.pop() {
        deepest = deepest.max(depth);
        if deepest > limit {
            break;
        }
        stack.extend(node.children().map(|child| (child, depth + 1)));
    }
    deepest
}

fn process_node<'a>(
    node: &'a AstNode<'a>,
    lines: &mut Vec<RenderedLine>,
    depth: usize,
    wrap_width: usize,
    list_marker: Option<String>,
) {
    match &node.data.borrow().value {
        NodeValue::Heading(heading) => {
            let text = extract_text(node);
            if !lines.is_empty() {
                ensure_trailing_empty_lines(lines, 1);
            }

            let prefix = "#".repeat(usize::from(heading.level));
            lines.push(RenderedLine::new(
                format!("{prefix} {text}"),
                LineType::Heading(heading.level),
            ));
            lines.push(RenderedLine::new(String::new(), LineType::Empty));
        }

        NodeValue::Paragraph => {
            let spans = collect_inline_spans(node);
            push_wrapped(lines, &spans, wrap_width, "", "", LineType::Paragraph);
            lines.push(RenderedLine::new(String::new(), LineType::Empty));
        }

        NodeValue::CodeBlock(code_block) => {
            let language = code_block
                .info
                .split_whitespace()
                .next()
                .filter(|s| !s.is_empty());
            render_code_block(lines, language, &code_block.literal, wrap_width);
            lines.push(RenderedLine::new(String::new(), LineType::Empty));
        }

        NodeValue::HtmlBlock(html) => {
            for raw_line in html.literal.lines() {
                lines.push(RenderedLine::new(raw_line.to_string(), LineType::Html));
            }
            lines.push(RenderedLine::new(String::new(), LineType::Empty));
        }

        NodeValue::List(list) => {
            let start = list.start;
            let delimiter = match list.delimiter {
                ListDelimType::Paren => ')',
                ListDelimType::Period => '.',
            };
            let number_width = (start + node.children().count().saturating_sub(1))
                .to_string()
                .len();

            for (index, child) in node.children().enumerate() {
                let marker = match list.list_type {
                    ListType::Bullet => "• ".to_string(),
                    ListType::Ordered => {
                        format!("{:>number_width$}{delimiter} ", start + index)
                    }
                };
                process_node(child, lines, depth + 1, wrap_width, Some(marker));
            }
            if depth == 0 {
                lines.push(RenderedLine::new(String::new(), LineType::Empty));
            }
        }

        NodeValue::Item(_) | NodeValue::TaskItem(_) => {
            render_list_item(node, lines, depth, wrap_width, list_marker);
        }

        NodeValue::BlockQuote => {
            render_blockquote(node, lines, wrap_width, 1);
            lines.push(RenderedLine::new(String::new(), LineType::Empty));
        }

        NodeValue::ThematicBreak => {
            lines.push(RenderedLine::new(
                "─".repeat(wrap_width.min(40)),
                LineType::HorizontalRule,
            ));
            lines.push(RenderedLine::new(String::new(), LineType::Empty));
        }

        NodeValue::Table(_) => {
            for line in render_table(node, wrap_width) {
                lines.push(RenderedLine::new(line, LineType::Table));
            }
            lines.push(RenderedLine::new(String::new(), LineType::Empty));
        }

        NodeValue::FootnoteDefinition(def) => {
            let label = format!("[^{}]: ", def.name);
            let continuation = " ".repeat(display_width(&label));
            let spans = collect_inline_spans(node);
            push_wrapped(
                lines,
                &spans,
                wrap_width,
                &label,
                &continuation,
                LineType::Paragraph,
            );
            lines.push(RenderedLine::new(String::new(), LineType::Empty));
        }

        _ => {
            for child in node.children() {
                process_node(child, lines, depth, wrap_width, list_marker.clone());
            }
        }
    }
}

fn render_list_item<'a>(
    node: &'a AstNode<'a>,
    lines: &mut Vec<RenderedLine>,
    depth: usize,
    wrap_width: usize,
    list_marker: Option<String>,
) {
    let indent = "  ".repeat(depth.saturating_sub(1));
    let marker = match &node.data.borrow().value {
        NodeValue::TaskItem(symbol) => task_marker(symbol.is_some()),
        _ => list_marker.unwrap_or_else(|| "- ".to_string()),
    };
    let prefix_first = format!("{indent}{marker}");
    let prefix_next = format!("{indent}{}", " ".repeat(display_width(&marker)));
    let mut rendered_paragraphs = 0usize;

    for child in node.children() {
        if matches!(child.data.borrow().value, NodeValue::Paragraph) {
            if rendered_paragraphs > 0 {
                lines.push(RenderedLine::new(String::new(), LineType::ListItem(depth)));
            }
            let spans = collect_inline_spans(child);
            let prefix = if rendered_paragraphs == 0 {
                &prefix_first
            } else {
                &prefix_next
            };
            push_wrapped(
                lines,
                &spans,
                wrap_width,
                prefix,
                &prefix_next,
                LineType::ListItem(depth),
            );
            rendered_paragraphs += 1;
        } else {
            if rendered_paragraphs == 0 {
                // Item whose first block is not a paragraph still shows its marker.
                lines.push(RenderedLine::new(
                    prefix_first.clone(),
                    LineType::ListItem(depth),
                ));
                rendered_paragraphs += 1;
            }
            process_node(child, lines, depth, wrap_width, None);
        }
    }

    if rendered_paragraphs == 0 {
        lines.push(RenderedLine::new(prefix_first, LineType::ListItem(depth)));
    }
}

fn task_marker(checked: bool) -> String {
    if checked { "✓ " } else { "□ " }.to_string()
}

fn render_code_block(
    lines: &mut Vec<RenderedLine>,
    language: Option<&str>,
    literal: &str,
    wrap_width: usize,
) {
    const CODE_RIGHT_PADDING: usize = 1;
    let content_width = literal
        .lines()
        .map(display_width)
        .max()
        .unwrap_or(0)
        .min(wrap_width.saturating_sub(4 + CODE_RIGHT_PADDING).max(1));
    let frame_inner_width = content_width + 2 + CODE_RIGHT_PADDING;
    let label = format!(" {} ", language.unwrap_or("code"));
    let visible_label = truncate_text(&label, frame_inner_width);
    lines.push(RenderedLine::new(
        format!(
            "┌{visible_label}{}┐",
            "─".repeat(frame_inner_width.saturating_sub(display_width(&visible_label)))
        ),
        LineType::CodeBlock,
    ));

    for highlighted in crate::highlight::highlight_code(language, literal) {
        let body = truncate_spans(&highlighted, content_width);
        let padding = content_width.saturating_sub(spans_width(&body)) + CODE_RIGHT_PADDING;

        let mut line_spans = Vec::with_capacity(body.len() + 2);
        line_spans.push(InlineSpan::new("│ ", InlineStyle::default()));
        line_spans.extend(body);
        line_spans.push(InlineSpan::new(
            format!("{} │", " ".repeat(padding)),
            InlineStyle::default(),
        ));
        let content = spans_to_string(&line_spans);
        lines.push(RenderedLine::with_spans(
            content,
            LineType::CodeBlock,
            line_spans,
        ));
    }

    lines.push(RenderedLine::new(
        format!("└{}┘", "─".repeat(frame_inner_width)),
        LineType::CodeBlock,
    ));
}

fn ensure_trailing_empty_lines(lines: &mut Vec<RenderedLine>, count: usize) {
    let existing = lines
        .iter()
        .rev()
        .take_while(|line| matches!(line.line_type(), LineType::Empty))
        .count();
    for _ in existing..count {
        lines.push(RenderedLine::new(String::new(), LineType::Empty));
    }
}

fn render_blockquote<'a>(
    node: &'a AstNode<'a>,
    lines: &mut Vec<RenderedLine>,
    wrap_width: usize,
    quote_depth: usize,
) {
    let prefix = quote_prefix(quote_depth);

    for child in node.children() {
        match &child.data.borrow().value {
            NodeValue::Paragraph => {
                let spans = collect_inline_spans(child);
                push_wrapped(
                    lines,
                    &spans,
                    wrap_width,
                    &prefix,
                    &prefix,
                    LineType::BlockQuote,
                );
            }
            NodeValue::BlockQuote => {
                render_blockquote(child, lines, wrap_width, quote_depth + 1);
            }
            _ => {
                let text = extract_text(child);
                for raw_line in text.lines() {
                    let spans = vec![InlineSpan::new(raw_line, InlineStyle::default())];
                    push_wrapped(
                        lines,
                        &spans,
                        wrap_width,
                        &prefix,
                        &prefix,
                        LineType::BlockQuote,
                    );
                }
            }
        }
    }
}

fn quote_prefix(depth: usize) -> String {
    "│ ".repeat(depth)
}

fn render_table<'a>(table_node: &'a AstNode<'a>, wrap_width: usize) -> Vec<String> {
    let (alignments, mut rows, has_header) = collect_table_rows(table_node);
    let num_cols = rows.iter().map(Vec::len).max().unwrap_or(0);
    if num_cols == 0 {
        return Vec::new();
    }

    for row in &mut rows {
        row.resize(num_cols, String::new());
    }

    let mut col_widths = vec![1_usize; num_cols];
    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            col_widths[idx] = col_widths[idx].max(display_width(cell));
        }
    }

    // Row width is 1 + sum(col_width + 3).
    let max_table_width = wrap_width.max(4);
    while 1 + col_widths.iter().sum::<usize>() + (3 * num_cols) > max_table_width {
        let Some((widest_idx, &widest)) = col_widths.iter().enumerate().max_by_key(|(_, w)| **w)
        else {
            break;
        };
        if widest <= 1 {
            break;
        }
        col_widths[widest_idx] -= 1;
    }

    let mut lines = vec![render_table_border(&col_widths, '┌', '┬', '┐')];
    for (idx, row) in rows.iter().enumerate() {
        lines.push(render_table_row(row, &col_widths, &alignments));
        if has_header && idx == 0 {
            lines.push(render_table_border(&col_widths, '├', '┼', '┤'));
        }
    }
    lines.push(render_table_border(&col_widths, '└', '┴', '┘'));
    lines
}

fn collect_table_rows<'a>(
    table_node: &'a AstNode<'a>,
) -> (Vec<TableAlignment>, Vec<Vec<String>>, bool) {
    let alignments = match &table_node.data.borrow().value {
        NodeValue::Table(table) => table.alignments.clone(),
        _ => Vec::new(),
    };

    let mut rows = Vec::new();
    let mut has_header = false;
    for row_node in table_node.children() {
        match row_node.data.borrow().value {
            NodeValue::TableRow(header) => has_header |= header,
            _ => continue,
        }
        let cells = row_node
            .children()
            .filter(|cell| matches!(cell.data.borrow().value, NodeValue::TableCell))
            .map(|cell| {
                extract_text(cell)
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();
        rows.push(cells);
    }

    (alignments, rows, has_header)
}

fn render_table_border(widths: &[usize], left: char, middle: char, right: char) -> String {
    let inner = widths
        .iter()
        .map(|width| "─".repeat(width + 2))
        .collect::<Vec<_>>()
        .join(&middle.to_string());
    format!("{left}{inner}{right}")
}

fn render_table_row(cells: &[String], widths: &[usize], alignments: &[TableAlignment]) -> String {
    let mut out = String::from("│");
    for (idx, width) in widths.iter().enumerate() {
        let content = truncate_text(cells.get(idx).map_or("", String::as_str), *width);
        let padding = width.saturating_sub(display_width(&content));
        let (left, right) = match alignments.get(idx).copied().unwrap_or(TableAlignment::None) {
            TableAlignment::Right => (padding, 0),
            TableAlignment::Center => (padding / 2, padding - padding / 2),
            TableAlignment::Left | TableAlignment::None => (0, padding),
        };
        out.push(' ');
        out.push_str(&" ".repeat(left));
        out.push_str(&content);
        out.push_str(&" ".repeat(right));
        out.push_str(" │");
    }
    out
}

/// Longest prefix of `text` whose display width fits in `max_width`.
///
/// Width is measured on the whole prefix, so sequences such as an emoji
/// followed by a variation selector count the way `display_width` does.
fn truncate_text(text: &str, max_width: usize) -> String {
    let mut out = String::new();
    for ch in text.chars() {
        out.push(ch);
        if display_width(&out) > max_width {
            out.pop();
            break;
        }
    }
    out
}

fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

fn extract_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut text = String::new();
    extract_text_recursive(node, &mut text);
    text
}

fn extract_text_recursive<'a>(node: &'a AstNode<'a>, text: &mut String) {
    match &node.data.borrow().value {
        NodeValue::Text(t) => text.push_str(t),
        NodeValue::Code(c) => {
            text.push('`');
            text.push_str(&c.literal);
            text.push('`');
        }
        NodeValue::HtmlInline(html) => text.push_str(html),
        NodeValue::FootnoteReference(reference) => {
            text.push_str(&format!("[^{}]", reference.name));
        }
        NodeValue::SoftBreak | NodeValue::LineBreak => text.push('\n'),
        _ => {
            for child in node.children() {
                extract_text_recursive(child, text);
            }
        }
    }
}

fn collect_inline_spans<'a>(node: &'a AstNode<'a>) -> Vec<InlineSpan> {
    let mut spans = Vec::new();
    collect_inline_spans_recursive(node, InlineStyle::default(), &mut spans);
    spans
}

fn collect_inline_spans_recursive<'a>(
    node: &'a AstNode<'a>,
    style: InlineStyle,
    spans: &mut Vec<InlineSpan>,
) {
    let mut next = style;
    match &node.data.borrow().value {
        // Nested blocks inside list items are rendered on their own.
        NodeValue::List(_) | NodeValue::Item(_) => return,
        NodeValue::Text(t) => {
            spans.push(InlineSpan::new(t.clone(), style));
            return;
        }
        NodeValue::Code(code) => {
            let code_style = InlineStyle {
                link: style.link,
                ..InlineStyle::code()
            };
            spans.push(InlineSpan::new(code.literal.clone(), code_style));
            return;
        }
        NodeValue::HtmlInline(html) => {
            spans.push(InlineSpan::new(html.clone(), style));
            return;
        }
        NodeValue::FootnoteReference(reference) => {
            spans.push(InlineSpan::new(format!("[^{}]", reference.name), style));
            return;
        }
        NodeValue::SoftBreak | NodeValue::LineBreak => {
            spans.push(InlineSpan::new(" ", style));
            return;
        }
        NodeValue::Emph => next.emphasis = true,
        NodeValue::Strong => next.strong = true,
        NodeValue::Strikethrough => next.strikethrough = true,
        NodeValue::Link(_) => next.link = true,
        _ => {}
    }
    for child in node.children() {
        collect_inline_spans_recursive(child, next, spans);
    }
}

fn push_wrapped(
    lines: &mut Vec<RenderedLine>,
    spans: &[InlineSpan],
    width: usize,
    prefix_first: &str,
    prefix_next: &str,
    line_type: LineType,
) {
    for line_spans in wrap_spans(spans, width, prefix_first, prefix_next) {
        let content = spans_to_string(&line_spans);
        lines.push(RenderedLine::with_spans(content, line_type, line_spans));
    }
}

/// Greedy word wrap. Words longer than `width` get a line of their own.
fn wrap_spans(
    spans: &[InlineSpan],
    width: usize,
    prefix_first: &str,
    prefix_next: &str,
) -> Vec<Vec<InlineSpan>> {
    let mut lines: Vec<Vec<InlineSpan>> = Vec::new();
    let mut current: Vec<InlineSpan> = Vec::new();
    let mut current_len = 0usize;
    let mut has_word = false;

    let start_line = |prefix: &str, current: &mut Vec<InlineSpan>, current_len: &mut usize| {
        current.clear();
        *current_len = display_width(prefix);
        if !prefix.is_empty() {
            current.push(InlineSpan::new(prefix, InlineStyle::default()));
        }
    };

    start_line(prefix_first, &mut current, &mut current_len);

    for token in spans.iter().flat_map(split_inline_tokens) {
        let token_len = display_width(token.text());
        let token_is_ws = token.text().chars().all(char::is_whitespace);

        if current_len + token_len > width && has_word {
            trim_trailing_whitespace(&mut current);
            lines.push(std::mem::take(&mut current));
            start_line(prefix_next, &mut current, &mut current_len);
            has_word = false;
        }

        // Drop leading whitespace at wrapped line starts.
        if token_is_ws && !has_word {
            continue;
        }

        current_len += token_len;
        current.push(token);
        has_word |= !token_is_ws;
    }

    trim_trailing_whitespace(&mut current);
    lines.push(current);
    lines
}

fn trim_trailing_whitespace(spans: &mut Vec<InlineSpan>) {
    while spans.len() > 1
        && spans
            .last()
            .is_some_and(|span| span.text().chars().all(char::is_whitespace))
    {
        spans.pop();
    }
}

fn split_inline_tokens(span: &InlineSpan) -> Vec<InlineSpan> {
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut ws_state: Option<bool> = None;

    for ch in span.text().chars() {
        let is_ws = ch.is_whitespace();
        if ws_state.is_some_and(|state| state != is_ws) {
            out.push(InlineSpan::new(std::mem::take(&mut buf), span.style()));
        }
        buf.push(ch);
        ws_state = Some(is_ws);
    }

    if !buf.is_empty() {
        out.push(InlineSpan::new(buf, span.style()));
    }
    out
}

fn spans_to_string(spans: &[InlineSpan]) -> String {
    spans.iter().map(InlineSpan::text).collect()
}

fn spans_width(spans: &[InlineSpan]) -> usize {
    spans.iter().map(|span| display_width(span.text())).sum()
}

fn truncate_spans(spans: &[InlineSpan], max_width: usize) -> Vec<InlineSpan> {
    let mut out = Vec::new();
    let mut remaining = max_width;
    for span in spans {
        if remaining == 0 {
            break;
        }
        let taken = truncate_text(span.text(), remaining);
        let taken_width = display_width(&taken);
        let taken_len = taken.len();
        if !taken.is_empty() {
            out.push(InlineSpan::new(taken, span.style()));
        }
        remaining = remaining.saturating_sub(taken_width);
        if taken_len < span.text().len() {
            break;
        }
    }
    out
}
