use crate::{formatter::Segment, theme};
use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub enum WrappingMode {
    Wrapped,
    Unwrapped,
    Truncated,
}

/// Styles one formatted line, emphasis included.
pub fn styled_line(segments: &[Segment]) -> Line<'static> {
    Line::from(
        segments
            .iter()
            .map(|s| Span::styled(s.text.clone(), theme::emphasis_style(s.emphasis)))
            .collect::<Vec<_>>(),
    )
}

pub fn fragment_into_lines(
    lines: &[Vec<Segment>],
    width: u16,
    wrapping_mode: WrappingMode,
) -> Vec<Line<'static>> {
    let styled = lines.iter().map(|segments| styled_line(segments));
    match wrapping_mode {
        WrappingMode::Wrapped => styled.flat_map(|line| wrap_line(line, width)).collect(),
        WrappingMode::Unwrapped => styled.collect(),
        WrappingMode::Truncated => styled
            .take(1)
            .map(|line| truncate_line(line, width))
            .collect(),
    }
}

pub fn line_width(line: &Line) -> usize {
    line.spans.iter().map(|s| s.content.width()).sum()
}

pub fn calculate_content_width(lines: &[Vec<Segment>]) -> usize {
    lines
        .iter()
        .map(|segments| segments.iter().map(|s| s.text.width()).sum())
        .max()
        .unwrap_or(0)
}

/// Cuts `line` to `width` columns, marking the cut with `..`.
pub fn truncate_line(line: Line<'static>, width: u16) -> Line<'static> {
    if width == 0 {
        return Line::from("");
    }

    let width = width as usize;
    if line_width(&line) <= width {
        return line;
    }

    let budget = width.saturating_sub(2);
    let mut used = 0;
    let mut spans = Vec::new();
    'outer: for span in line.spans {
        let mut kept = String::new();
        for ch in span.content.chars() {
            let w = ch.width().unwrap_or(0);
            if used + w > budget {
                if !kept.is_empty() {
                    spans.push(Span::styled(kept, span.style));
                }
                break 'outer;
            }
            used += w;
            kept.push(ch);
        }
        spans.push(Span::styled(kept, span.style));
    }
    spans.push(Span::raw(".."));
    Line::from(spans)
}

fn wrap_line(line: Line<'static>, width: u16) -> Vec<Line<'static>> {
    if width == 0 {
        return vec![];
    }

    let width = width as usize;
    if line.spans.iter().all(|s| s.content.is_empty()) {
        return vec![Line::from("")];
    }

    let mut lines = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut current_width = 0;

    for span in line.spans {
        let mut chunk = String::new();
        for ch in span.content.chars() {
            let w = ch.width().unwrap_or(0);
            if current_width + w > width && current_width > 0 {
                if !chunk.is_empty() {
                    current.push(Span::styled(std::mem::take(&mut chunk), span.style));
                }
                lines.push(Line::from(std::mem::take(&mut current)));
                current_width = 0;
            }
            chunk.push(ch);
            current_width += w;
        }
        if !chunk.is_empty() {
            current.push(Span::styled(chunk, span.style));
        }
    }

    if !current.is_empty() {
        lines.push(Line::from(current));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::Emphasis;

    fn plain(text: &str) -> Vec<Vec<Segment>> {
        text.split('\n')
            .map(|line| {
                vec![Segment {
                    text: line.to_string(),
                    emphasis: Emphasis::None,
                }]
            })
            .collect()
    }

    fn texts(lines: &[Line]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_zero_width() {
        assert!(fragment_into_lines(&plain("hello"), 0, WrappingMode::Wrapped).is_empty());
    }

    #[test]
    fn test_short_content() {
        let result = fragment_into_lines(&plain("hello"), 10, WrappingMode::Wrapped);
        assert_eq!(texts(&result), vec!["hello"]);
    }

    #[test]
    fn test_exact_width() {
        let result = fragment_into_lines(&plain("hello"), 5, WrappingMode::Wrapped);
        assert_eq!(texts(&result), vec!["hello"]);
    }

    #[test]
    fn test_long_content() {
        let result = fragment_into_lines(&plain("hello world"), 5, WrappingMode::Wrapped);
        assert_eq!(texts(&result), vec!["hello", " worl", "d"]);
    }

    #[test]
    fn test_blank_lines_survive_wrapping() {
        let result = fragment_into_lines(&plain("hello\n\nworld"), 10, WrappingMode::Wrapped);
        assert_eq!(texts(&result), vec!["hello", "", "world"]);
    }

    #[test]
    fn test_wrapping_keeps_emphasis_across_breaks() {
        let lines = vec![vec![
            Segment {
                text: "buy ".into(),
                emphasis: Emphasis::None,
            },
            Segment {
                text: "$AAPL".into(),
                emphasis: Emphasis::Ticker,
            },
        ]];
        let result = fragment_into_lines(&lines, 6, WrappingMode::Wrapped);
        assert_eq!(texts(&result), vec!["buy $A", "APL"]);
        assert_eq!(result[1].spans[0].style, theme::TICKER_STYLE);
    }

    #[test]
    fn test_unwrapped_keeps_long_lines() {
        let result = fragment_into_lines(
            &plain("this is a very long line that exceeds width\nshort"),
            10,
            WrappingMode::Unwrapped,
        );
        assert_eq!(
            texts(&result),
            vec!["this is a very long line that exceeds width", "short"]
        );
    }

    #[test]
    fn test_truncated() {
        let result = fragment_into_lines(&plain("hello world\nsecond"), 5, WrappingMode::Truncated);
        assert_eq!(texts(&result), vec!["hel.."]);
    }

    #[test]
    fn test_truncated_short_and_exact() {
        let short = fragment_into_lines(&plain("hi"), 5, WrappingMode::Truncated);
        assert_eq!(texts(&short), vec!["hi"]);
        let exact = fragment_into_lines(&plain("hello"), 5, WrappingMode::Truncated);
        assert_eq!(texts(&exact), vec!["hello"]);
    }

    #[test]
    fn test_truncated_zero_width() {
        let result = fragment_into_lines(&plain("hello"), 0, WrappingMode::Truncated);
        assert_eq!(texts(&result), vec![""]);
    }

    #[test]
    fn test_wide_chars_count_double() {
        let line = Line::from("日本語テキスト");
        assert_eq!(line_width(&line), 14);
        assert_eq!(truncate_line(line, 6).to_string(), "日本..");
    }

    #[test]
    fn test_content_width() {
        assert_eq!(calculate_content_width(&plain("ab\nabcd\n")), 4);
    }
}
