//! How a dish card looks, as plain data. The renderer decides what to do with
//! it on a given output.

use crossterm::style::Color;

/// Accent of the "Publish" action (#4caf50).
pub const PUBLISH_ACCENT: Color = Color::Rgb {
    r: 0x4c,
    g: 0xaf,
    b: 0x50,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Filter {
    None,
    /// Desaturate by the given percentage.
    Grayscale(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonStyle {
    pub background: Option<Color>,
    pub foreground: Color,
}

impl ButtonStyle {
    pub const NEUTRAL: Self = Self {
        background: None,
        foreground: Color::Reset,
    };

    pub const ACCENT: Self = Self {
        background: Some(PUBLISH_ACCENT),
        foreground: Color::White,
    };
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Presentation {
    /// Applies to the image and the title, never to the button.
    pub opacity: f32,
    /// Applies to the image only.
    pub filter: Filter,
    pub label: &'static str,
    pub button: ButtonStyle,
}

impl Presentation {
    pub fn is_faded(&self) -> bool {
        self.opacity < 1.0
    }
}

pub fn presentation_for(is_published: bool) -> Presentation {
    if is_published {
        Presentation {
            opacity: 1.0,
            filter: Filter::None,
            label: "Unpublish",
            button: ButtonStyle::NEUTRAL,
        }
    } else {
        Presentation {
            opacity: 0.4,
            filter: Filter::Grayscale(80),
            label: "Publish",
            button: ButtonStyle::ACCENT,
        }
    }
}

/// Chrome shared by every card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardStyle {
    pub rounded: bool,
    /// Columns of padding inside the border on each side.
    pub padding: usize,
    pub centered: bool,
}

impl Default for CardStyle {
    fn default() -> Self {
        Self {
            rounded: true,
            padding: 1,
            centered: true,
        }
    }
}

/// Terminal take on `repeat(auto-fill, minmax(<min>, 1fr))`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub min_column_width: usize,
    pub gap: usize,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            min_column_width: 24,
            gap: 2,
        }
    }
}

impl GridLayout {
    /// As many columns of at least `min_column_width` as fit, never fewer
    /// than one.
    pub fn columns_for(&self, width: usize) -> usize {
        ((width + self.gap) / (self.min_column_width + self.gap)).max(1)
    }

    /// Width of each column once the free space is shared out.
    pub fn column_width(&self, width: usize) -> usize {
        let columns = self.columns_for(width);
        let gaps = self.gap * (columns - 1);
        (width.saturating_sub(gaps) / columns).max(1)
    }
}
