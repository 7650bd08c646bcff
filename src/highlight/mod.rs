//! Syntax highlighting for fenced code blocks in the preview.
//!
//! Uses syntect with its bundled Sublime Text syntax definitions. The syntax
//! set and theme are loaded once, on first use, by whichever thread renders
//! the first code block.

use std::sync::OnceLock;

use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;

use crate::document::{InlineColor, InlineSpan, InlineStyle};

/// Highlight `code`, one span list per source line.
///
/// Unknown or missing languages fall back to unstyled code spans.
pub fn highlight_code(language: Option<&str>, code: &str) -> Vec<Vec<InlineSpan>> {
    let syntax_set = syntax_set();
    let syntax = language.and_then(|lang| {
        syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| syntax_set.find_syntax_by_name(lang))
    });

    let Some(syntax) = syntax else {
        return code
            .lines()
            .map(|line| vec![InlineSpan::new(line, InlineStyle::code())])
            .collect();
    };

    let mode = background_mode();
    let mut highlighter = HighlightLines::new(syntax, theme());
    code.lines()
        .map(|line| {
            let ranges = highlighter
                .highlight_line(line, syntax_set)
                .unwrap_or_default();
            if ranges.is_empty() {
                return vec![InlineSpan::new(line, InlineStyle::code())];
            }
            ranges
                .into_iter()
                .map(|(style, text)| {
                    let fg = InlineColor {
                        r: style.foreground.r,
                        g: style.foreground.g,
                        b: style.foreground.b,
                    };
                    let inline_style = InlineStyle {
                        fg: Some(adjust_fg_for_background(fg, mode)),
                        ..InlineStyle::code()
                    };
                    InlineSpan::new(text, inline_style)
                })
                .collect()
        })
        .collect()
}

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(|| {
        let _scope = crate::perf::scope("highlight.syntax_set.load_defaults");
        SyntaxSet::load_defaults_newlines()
    })
}

fn theme() -> &'static Theme {
    static THEME: OnceLock<Theme> = OnceLock::new();
    THEME.get_or_init(|| {
        let _scope = crate::perf::scope("highlight.theme.load_defaults");
        let theme_set = ThemeSet::load_defaults();
        let preferred = match background_mode() {
            BackgroundMode::Dark => ["base16-ocean.dark", "Solarized (dark)"].as_slice(),
            BackgroundMode::Light => ["InspiredGitHub", "Solarized (light)"].as_slice(),
        };

        preferred
            .iter()
            .find_map(|name| theme_set.themes.get(*name))
            .or_else(|| theme_set.themes.values().next())
            .cloned()
            .unwrap_or_default()
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BackgroundMode {
    Dark,
    Light,
}

/// Whether the terminal reports a light background through `COLORFGBG`.
pub fn is_light_background() -> bool {
    background_mode() == BackgroundMode::Light
}

fn background_mode() -> BackgroundMode {
    background_mode_from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref())
}

fn background_mode_from_colorfgbg(colorfgbg: Option<&str>) -> BackgroundMode {
    let bg = colorfgbg
        .and_then(|value| value.rsplit(';').next())
        .and_then(|bg| bg.parse::<u8>().ok());
    match bg {
        Some(bg) if bg >= 7 => BackgroundMode::Light,
        _ => BackgroundMode::Dark,
    }
}

fn adjust_fg_for_background(color: InlineColor, mode: BackgroundMode) -> InlineColor {
    if mode == BackgroundMode::Dark {
        return color;
    }
    let luma = 0.0722f32.mul_add(
        f32::from(color.b),
        0.2126f32.mul_add(f32::from(color.r), 0.7152 * f32::from(color.g)),
    );
    if luma < 155.0 {
        return color;
    }
    let darken = |c: u8| (f32::from(c) * 0.42).round() as u8;
    InlineColor {
        r: darken(color.r),
        g: darken(color.g),
        b: darken(color.b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_rust_produces_colored_spans() {
        let lines = highlight_code(Some("rust"), "fn main() {\n    let x = 1;\n}\n");

        assert_eq!(lines.len(), 3);
        assert!(lines.iter().flatten().any(|span| span.style().fg.is_some()));
    }

    #[test]
    fn test_highlight_keeps_line_text() {
        let lines = highlight_code(Some("rust"), "let x = 1;");
        let text: String = lines[0].iter().map(InlineSpan::text).collect();
        assert_eq!(text, "let x = 1;");
    }

    #[test]
    fn test_unknown_language_falls_back_to_plain_code() {
        let lines = highlight_code(Some("nope"), "just text");

        assert_eq!(lines.len(), 1);
        assert!(lines[0].iter().all(|span| span.style().code));
        assert!(lines[0].iter().all(|span| span.style().fg.is_none()));
    }

    #[test]
    fn test_colorfgbg_picks_background() {
        assert_eq!(background_mode_from_colorfgbg(Some("15;0")), BackgroundMode::Dark);
        assert_eq!(background_mode_from_colorfgbg(Some("0;15")), BackgroundMode::Light);
        assert_eq!(background_mode_from_colorfgbg(None), BackgroundMode::Dark);
        assert_eq!(background_mode_from_colorfgbg(Some("junk")), BackgroundMode::Dark);
    }

    #[test]
    fn test_light_mode_darkens_bright_fg() {
        let bright = InlineColor {
            r: 240,
            g: 230,
            b: 120,
        };
        let adjusted = adjust_fg_for_background(bright, BackgroundMode::Light);
        assert!(adjusted.r < bright.r);
        assert!(adjusted.g < bright.g);
        assert!(adjusted.b < bright.b);
        assert_eq!(adjust_fg_for_background(bright, BackgroundMode::Dark), bright);
    }
}
