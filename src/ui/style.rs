//! Colors and modifiers for preview content.
//!
//! Uses ANSI colors so the preview follows the terminal's palette, with
//! darker alternatives when the terminal reports a light background.

use ratatui::style::{Color, Modifier, Style};

use crate::document::{InlineColor, InlineStyle, LineType};

/// Base style for a rendered line.
pub fn style_for_line_type(line_type: &LineType) -> Style {
    let light_bg = crate::highlight::is_light_background();
    let pick = |light: u8, dark: Color| if light_bg { Color::Indexed(light) } else { dark };
    match line_type {
        LineType::Heading(1) => Style::default()
            .fg(pick(24, Color::Cyan))
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        LineType::Heading(2) => Style::default()
            .fg(pick(22, Color::Green))
            .add_modifier(Modifier::BOLD),
        LineType::Heading(3) => Style::default()
            .fg(pick(58, Color::Yellow))
            .add_modifier(Modifier::BOLD),
        LineType::Heading(_) => Style::default()
            .fg(pick(54, Color::Magenta))
            .add_modifier(Modifier::BOLD),
        LineType::CodeBlock => Style::default().fg(pick(238, Color::Indexed(245))),
        LineType::BlockQuote => Style::default()
            .fg(pick(24, Color::Blue))
            .add_modifier(Modifier::ITALIC),
        LineType::HorizontalRule => Style::default()
            .fg(pick(241, Color::Indexed(240)))
            .add_modifier(Modifier::DIM),
        LineType::Html => Style::default()
            .fg(pick(90, Color::Indexed(244)))
            .add_modifier(Modifier::DIM),
        LineType::ListItem(_) | LineType::Table | LineType::Paragraph | LineType::Empty => {
            Style::default()
        }
    }
}

/// Style for an inline span, merged with the line's base style.
pub fn style_for_inline(base: Style, inline: InlineStyle) -> Style {
    let mut style = base;

    if let Some(fg) = inline.fg {
        style = style
            .fg(fg_color_for_terminal(fg))
            .remove_modifier(Modifier::DIM);
    }
    if inline.emphasis {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if inline.strong {
        style = style.add_modifier(Modifier::BOLD);
    }
    if inline.strikethrough {
        style = style.add_modifier(Modifier::CROSSED_OUT);
    }
    if inline.link {
        style = style.add_modifier(Modifier::UNDERLINED);
        if inline.fg.is_none() {
            let light_bg = crate::highlight::is_light_background();
            style = style.fg(if light_bg { Color::Blue } else { Color::LightBlue });
        }
    }
    // Inline code outside a highlighted block.
    if inline.code && inline.fg.is_none() && base == Style::default() {
        let light_bg = crate::highlight::is_light_background();
        style = style.fg(if light_bg { Color::Indexed(88) } else { Color::Red });
    }

    style
}

fn fg_color_for_terminal(fg: InlineColor) -> Color {
    let truecolor = supports_truecolor_from_env(
        std::env::var("COLORTERM").ok().as_deref(),
        std::env::var("TERM").ok().as_deref(),
    );
    if truecolor {
        Color::Rgb(fg.r, fg.g, fg.b)
    } else {
        Color::Indexed(rgb_to_xterm_256(fg.r, fg.g, fg.b))
    }
}

fn supports_truecolor_from_env(colorterm: Option<&str>, term: Option<&str>) -> bool {
    let has = |value: Option<&str>, needles: &[&str]| {
        value.is_some_and(|v| {
            let lower = v.to_ascii_lowercase();
            needles.iter().any(|n| lower.contains(n))
        })
    };
    has(colorterm, &["truecolor", "24bit"]) || has(term, &["direct", "truecolor"])
}

fn rgb_to_xterm_256(r: u8, g: u8, b: u8) -> u8 {
    // Always 0-5.
    #[allow(clippy::cast_possible_truncation)]
    let to_cube = |v: u8| ((u16::from(v) * 5) / 255) as u8;
    16 + (36 * to_cube(r)) + (6 * to_cube(g)) + to_cube(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings_are_bold() {
        for level in 1..=6 {
            let style = style_for_line_type(&LineType::Heading(level));
            assert!(style.add_modifier.contains(Modifier::BOLD));
        }
    }

    #[test]
    fn test_inline_flags_map_to_modifiers() {
        let inline = InlineStyle {
            emphasis: true,
            strong: true,
            strikethrough: true,
            ..InlineStyle::default()
        };
        let style = style_for_inline(Style::default(), inline);
        assert!(style.add_modifier.contains(Modifier::ITALIC));
        assert!(style.add_modifier.contains(Modifier::BOLD));
        assert!(style.add_modifier.contains(Modifier::CROSSED_OUT));
    }

    #[test]
    fn test_truecolor_detection() {
        assert!(supports_truecolor_from_env(Some("truecolor"), None));
        assert!(supports_truecolor_from_env(None, Some("xterm-direct")));
        assert!(!supports_truecolor_from_env(None, Some("xterm-256color")));
    }

    #[test]
    fn test_rgb_to_xterm_cube_corners() {
        assert_eq!(rgb_to_xterm_256(0, 0, 0), 16);
        assert_eq!(rgb_to_xterm_256(255, 255, 255), 231);
    }
}
