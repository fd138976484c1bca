use catppuccin::PALETTE;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::BorderType;

/// Convert a catppuccin color to a ratatui color.
const fn catppuccin_to_color(c: &catppuccin::Color) -> Color {
    Color::Rgb(c.rgb.r, c.rgb.g, c.rgb.b)
}

const FLAVORS: [(&str, &catppuccin::Flavor); 4] = [
    ("Catppuccin Mocha", &PALETTE.mocha),
    ("Catppuccin Macchiato", &PALETTE.macchiato),
    ("Catppuccin Frappé", &PALETTE.frappe),
    ("Catppuccin Latte", &PALETTE.latte),
];

/// Colors by role rather than by palette name.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub base: Color,
    pub mantle: Color,
    pub surface: Color,
    pub overlay: Color,
    pub text: Color,
    pub subtext: Color,
    pub accent: Color,
    pub secondary: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub border: Color,
    pub border_focused: Color,
    pub border_type: BorderType,
}

impl Theme {
    const fn from_catppuccin(flavor: &catppuccin::Flavor) -> Self {
        let c = &flavor.colors;
        Self {
            base: catppuccin_to_color(&c.base),
            mantle: catppuccin_to_color(&c.mantle),
            surface: catppuccin_to_color(&c.surface0),
            overlay: catppuccin_to_color(&c.overlay0),
            text: catppuccin_to_color(&c.text),
            subtext: catppuccin_to_color(&c.subtext0),
            accent: catppuccin_to_color(&c.mauve),
            secondary: catppuccin_to_color(&c.blue),
            success: catppuccin_to_color(&c.green),
            warning: catppuccin_to_color(&c.peach),
            error: catppuccin_to_color(&c.red),
            border: catppuccin_to_color(&c.surface2),
            border_focused: catppuccin_to_color(&c.lavender),
            border_type: BorderType::Rounded,
        }
    }

    /// Look up a theme by name, falling back to the default flavour.
    pub fn named(name: &str) -> Self {
        FLAVORS
            .iter()
            .find(|(flavor, _)| flavor.eq_ignore_ascii_case(name))
            .map(|(_, flavor)| Self::from_catppuccin(flavor))
            .unwrap_or_default()
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        FLAVORS.iter().map(|(name, _)| *name)
    }

    pub fn title(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn selection(&self) -> Style {
        Style::default().fg(self.base).bg(self.accent)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_catppuccin(&PALETTE.mocha)
    }
}
