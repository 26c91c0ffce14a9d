use owo_colors::{OwoColorize, Style};
use std::fmt::Display;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// What a piece of terminal text means; the theme decides how it looks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Header,
    Error,
    Info,
    Label,
    Muted,
    Aggressor,
    Victim,
}

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    colored: bool,
}

impl Theme {
    /// Colors only on a terminal that has not opted out (`NO_COLOR`, `CLICOLOR=0`)
    pub fn detect() -> Self {
        if console::Term::stdout().is_term() && console::colors_enabled() {
            Self { colored: true }
        } else {
            Self::plain()
        }
    }

    pub fn plain() -> Self {
        Self { colored: false }
    }

    pub fn style(&self, role: Role) -> Style {
        if !self.colored {
            return Style::new();
        }
        match role {
            Role::Header => Style::new().cyan().bold(),
            Role::Error => Style::new().red().bold(),
            Role::Info => Style::new().magenta(),
            Role::Label => Style::new().white().dimmed(),
            Role::Muted => Style::new().bright_black(),
            Role::Aggressor => Style::new().red(),
            Role::Victim => Style::new().yellow(),
        }
    }

    pub fn paint(&self, role: Role, text: impl Display) -> String {
        text.style(self.style(role)).to_string()
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}

/// Paint with the process-wide theme
pub fn paint(role: Role, text: impl Display) -> String {
    theme().paint(role, text)
}
