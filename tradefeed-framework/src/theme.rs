use crate::{formatter::Emphasis, record::RecordKind};
use ratatui::{prelude::*, style::Color};

pub const TEXT_FG_COLOR: Color = Color::Gray;

pub const MUTED_FG_COLOR: Color = Color::DarkGray;

pub const BORDER_COLOR: Color = Color::Gray;

pub const LIVE_BORDER_COLOR: Color = Color::Yellow;

pub const KIND_COLORS: &[(&str, Color)] = &[
    ("trade", Color::LightBlue),
    ("portfolio", Color::Rgb(255, 165, 0)), // orange
];

pub fn kind_color(kind: &RecordKind) -> Color {
    KIND_COLORS
        .iter()
        .find(|(code, _)| *code == kind.code())
        .map(|(_, color)| *color)
        .unwrap_or(Color::Gray)
}

pub fn emphasis_style(emphasis: Emphasis) -> Style {
    match emphasis {
        Emphasis::None => Style::new(),
        Emphasis::Ticker => TICKER_STYLE,
        Emphasis::Buy => BUY_STYLE,
        Emphasis::Sell => SELL_STYLE,
    }
}

pub const TICKER_STYLE: Style = Style::new()
    .fg(Color::LightCyan)
    .add_modifier(Modifier::BOLD);

pub const BUY_STYLE: Style = Style::new()
    .fg(Color::LightGreen)
    .add_modifier(Modifier::BOLD);

pub const SELL_STYLE: Style = Style::new()
    .fg(Color::LightRed)
    .add_modifier(Modifier::BOLD);

pub const SELECTED_STYLE: Style = Style::new().bg(Color::DarkGray);

pub const LIVE_STYLE: Style = Style::new().fg(Color::LightYellow);

pub const INFO_STYLE: Style = Style::new().fg(Color::White);

pub const WARN_STYLE: Style = Style::new().fg(Color::LightYellow);

pub const ERROR_STYLE: Style = Style::new().fg(Color::LightRed);

pub const DEBUG_STYLE: Style = Style::new().fg(Color::LightGreen);

pub const DISPLAY_EVENT_STYLE: Style = Style::new()
    .fg(Color::Black)
    .bg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const AFFORDANCE_STYLE: Style = Style::new()
    .fg(Color::Black)
    .bg(Color::LightGreen)
    .add_modifier(Modifier::BOLD);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_colors() {
        assert_eq!(kind_color(&RecordKind::Trade), Color::LightBlue);
        assert_eq!(kind_color(&RecordKind::Portfolio), Color::Rgb(255, 165, 0));
        assert_eq!(kind_color(&RecordKind::Other("alert".into())), Color::Gray);
    }
}
