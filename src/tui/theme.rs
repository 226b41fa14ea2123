#![forbid(unsafe_code)]

use ratatui::style::{Color, Modifier, Style};

use crate::task::model::Priority;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub bg: Color,
    pub fg: Color,
    pub muted: Color,
    pub accent: Color,
    pub highlight_fg: Color,
    pub highlight_bg: Color,
    pub error: Color,
    pub done: Color,
}

impl Palette {
    pub const LIGHT: Palette = Palette {
        bg: Color::Reset,
        fg: Color::Reset,
        muted: Color::DarkGray,
        accent: Color::Blue,
        highlight_fg: Color::Black,
        highlight_bg: Color::LightBlue,
        error: Color::Red,
        done: Color::Green,
    };

    pub const DARK: Palette = Palette {
        bg: Color::Rgb(24, 26, 33),
        fg: Color::Rgb(220, 223, 228),
        muted: Color::Rgb(120, 126, 138),
        accent: Color::Rgb(130, 170, 255),
        highlight_fg: Color::Rgb(24, 26, 33),
        highlight_bg: Color::Rgb(130, 170, 255),
        error: Color::Rgb(240, 113, 120),
        done: Color::Rgb(152, 195, 121),
    };

    #[must_use]
    pub fn for_mode(dark: bool) -> Self {
        if dark { Self::DARK } else { Self::LIGHT }
    }

    #[must_use]
    pub fn base(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    #[must_use]
    pub fn muted(&self) -> Style {
        Style::default().fg(self.muted)
    }

    #[must_use]
    pub fn highlight(&self) -> Style {
        Style::default()
            .fg(self.highlight_fg)
            .bg(self.highlight_bg)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn priority(&self, priority: Priority) -> Style {
        match priority {
            Priority::Low => Style::default().fg(self.muted),
            Priority::Medium => Style::default().fg(Color::Yellow),
            Priority::High => Style::default().fg(self.error).add_modifier(Modifier::BOLD),
        }
    }

    #[must_use]
    pub fn completed(&self) -> Style {
        Style::default()
            .fg(self.done)
            .add_modifier(Modifier::CROSSED_OUT)
    }
}
