//! Semantic color palette backed by owo-colors.

use owo_colors::{OwoColorize, Style};

fn allow_style() -> Style {
    Style::new().green().bold()
}

fn deny_style() -> Style {
    Style::new().red().bold()
}

fn warning_style() -> Style {
    Style::new().yellow()
}

fn muted_style() -> Style {
    Style::new().dimmed()
}

fn code_style() -> Style {
    Style::new().blue()
}

/// Applies a semantic style unless colors are disabled.
pub trait SemanticStyle {
    /// Green bold, for allowed decisions and successes.
    fn allow(&self) -> String;
    /// Red bold, for denied decisions and errors.
    fn deny(&self) -> String;
    fn warning(&self) -> String;
    fn muted(&self) -> String;
    /// Blue, for URIs and names.
    fn code(&self) -> String;
}

fn styled<T: std::fmt::Display + ?Sized>(value: &T, style: Style) -> String {
    if super::no_color() {
        value.to_string()
    } else {
        value.style(style).to_string()
    }
}

impl<T: std::fmt::Display + ?Sized> SemanticStyle for T {
    fn allow(&self) -> String {
        styled(self, allow_style())
    }

    fn deny(&self) -> String {
        styled(self, deny_style())
    }

    fn warning(&self) -> String {
        styled(self, warning_style())
    }

    fn muted(&self) -> String {
        styled(self, muted_style())
    }

    fn code(&self) -> String {
        styled(self, code_style())
    }
}
