//! Palette for scanwise
//! A greyscale base with three signal colours for verdicts and severity

use crate::component::{BadgeVariant, CardVariant, Severity};
use ratatui::style::{Color, Modifier, Style};

pub struct Theme;

impl Theme {
    // ─────────────────────────────────────────────────────────────────────
    // Greyscale base, brightest to darkest
    // ─────────────────────────────────────────────────────────────────────

    pub const WHITE: Color = Color::Rgb(255, 255, 255);
    pub const GREY_50: Color = Color::Rgb(250, 250, 250);
    /// Primary text
    pub const GREY_100: Color = Color::Rgb(220, 220, 220);
    pub const GREY_200: Color = Color::Rgb(180, 180, 180);
    /// Muted text
    pub const GREY_300: Color = Color::Rgb(140, 140, 140);
    pub const GREY_400: Color = Color::Rgb(100, 100, 100);
    /// Borders and skeleton blocks
    pub const GREY_500: Color = Color::Rgb(70, 70, 70);
    pub const GREY_600: Color = Color::Rgb(45, 45, 45);
    pub const GREY_700: Color = Color::Rgb(35, 35, 35);
    pub const GREY_800: Color = Color::Rgb(28, 28, 28);
    pub const GREY_900: Color = Color::Rgb(18, 18, 18);

    pub const BG: Color = Self::GREY_900;

    // ─────────────────────────────────────────────────────────────────────
    // Signal colours
    // ─────────────────────────────────────────────────────────────────────

    pub const GREEN: Color = Color::Rgb(100, 200, 100);
    pub const YELLOW: Color = Color::Rgb(220, 180, 80);
    pub const RED: Color = Color::Rgb(200, 100, 100);

    pub const SPINNER_BRAILLE: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

    /// Shimmer sweep, dim to bright and back
    pub const SHIMMER: [Color; 6] = [
        Self::GREY_700,
        Self::GREY_600,
        Self::GREY_500,
        Self::GREY_400,
        Self::GREY_500,
        Self::GREY_600,
    ];

    pub const SKELETON_BLOCK: char = '▒';
    pub const BAR_FILLED: char = '█';
    pub const BAR_EMPTY: char = '░';
    pub const BULLET_FILLED: char = '●';
    pub const BULLET_EMPTY: char = '○';
    pub const CHECK_MARK: char = '✓';
    pub const WARNING_MARK: char = '⚠';
    pub const DOT_SEPARATOR: char = '·';

    pub const BOX_ROUND_TL: char = '╭';
    pub const BOX_ROUND_TR: char = '╮';
    pub const BOX_ROUND_BL: char = '╰';
    pub const BOX_ROUND_BR: char = '╯';
    pub const BOX_HORIZONTAL: char = '─';
    pub const BOX_VERTICAL: char = '│';

    pub const BADGE_OPEN: &'static str = "⟨";
    pub const BADGE_CLOSE: &'static str = "⟩";

    pub const APP_LOGO: &'static str = "◉ SCANWISE";

    // ─────────────────────────────────────────────────────────────────────
    // Styles
    // ─────────────────────────────────────────────────────────────────────

    pub fn bg() -> Style {
        Style::default().bg(Self::BG)
    }

    pub fn text() -> Style {
        Style::default().fg(Self::GREY_100)
    }

    pub fn text_muted() -> Style {
        Style::default().fg(Self::GREY_300)
    }

    pub fn text_dim() -> Style {
        Style::default().fg(Self::GREY_400)
    }

    pub fn headline() -> Style {
        Style::default()
            .fg(Self::GREY_50)
            .add_modifier(Modifier::BOLD)
    }

    pub fn caption() -> Style {
        Style::default()
            .fg(Self::GREY_300)
            .add_modifier(Modifier::ITALIC)
    }

    pub fn border() -> Style {
        Style::default().fg(Self::GREY_500)
    }

    pub fn key() -> Style {
        Style::default()
            .fg(Self::WHITE)
            .add_modifier(Modifier::BOLD)
    }

    pub fn severity_color(severity: Option<Severity>) -> Color {
        match severity {
            Some(Severity::High) => Self::RED,
            Some(Severity::Med) => Self::YELLOW,
            Some(Severity::Low) => Self::GREY_200,
            None => Self::GREY_300,
        }
    }

    pub fn card_color(variant: CardVariant) -> Color {
        match variant {
            CardVariant::Danger => Self::RED,
            CardVariant::Warning => Self::YELLOW,
            CardVariant::Success => Self::GREEN,
            CardVariant::Neutral => Self::GREY_500,
        }
    }

    pub fn badge_style(variant: BadgeVariant) -> Style {
        let bg = match variant {
            BadgeVariant::Success => Self::GREEN,
            BadgeVariant::Warning => Self::YELLOW,
            BadgeVariant::Danger => Self::RED,
            BadgeVariant::Neutral => Self::GREY_600,
        };
        let fg = match variant {
            BadgeVariant::Neutral => Self::GREY_100,
            _ => Self::GREY_900,
        };
        Style::default()
            .fg(fg)
            .bg(bg)
            .add_modifier(Modifier::BOLD)
    }

    /// Shimmer colour for a skeleton cell at `phase`, offset by column so
    /// the highlight sweeps across.
    pub fn shimmer(phase: usize, column: usize) -> Color {
        Self::SHIMMER[(phase + Self::SHIMMER.len() - column % Self::SHIMMER.len()) % Self::SHIMMER.len()]
    }

    /// Blend `color` toward the background. `opacity` 1.0 leaves it as is,
    /// 0.0 makes it the background. Non-RGB colours snap at one half.
    pub fn fade(color: Color, opacity: f32) -> Color {
        let opacity = opacity.clamp(0.0, 1.0);
        match (color, Self::BG) {
            (Color::Rgb(r, g, b), Color::Rgb(br, bg, bb)) => {
                let mix = |c: u8, base: u8| -> u8 {
                    (base as f32 + (c as f32 - base as f32) * opacity).round() as u8
                };
                Color::Rgb(mix(r, br), mix(g, bg), mix(b, bb))
            }
            _ if opacity >= 0.5 => color,
            _ => Self::BG,
        }
    }
}
