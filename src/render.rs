//! Text rendering of the dashboard view as a grid of cards.

use crossterm::style::{Attribute, Color, ContentStyle};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::dashboard::{Card, View};
use crate::presentation::{CardStyle, Filter, GridLayout, Presentation};

pub const TITLE: &str = "Dish Dashboard";
pub const LOADING_PLACEHOLDER: &str = "Loading dishes...";

#[derive(Debug, Clone)]
pub struct Renderer {
    pub grid: GridLayout,
    pub card: CardStyle,
    /// Emit ANSI styling. Off for logs, pipes and tests.
    pub styled: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            grid: GridLayout::default(),
            card: CardStyle::default(),
            styled: true,
        }
    }
}

impl Renderer {
    pub fn plain() -> Self {
        Self {
            styled: false,
            ..Self::default()
        }
    }

    /// Render the whole page for a terminal `width` columns wide.
    pub fn render(&self, view: &View<'_>, width: usize) -> String {
        let mut heading = ContentStyle::new();
        heading.attributes.set(Attribute::Bold);

        let mut out = self.paint(TITLE, heading);
        out.push_str("\n\n");

        let cards = match view {
            View::Loading => {
                out.push_str(LOADING_PLACEHOLDER);
                out.push('\n');
                return out;
            }
            View::Grid(cards) => cards,
        };

        let columns = self.grid.columns_for(width);
        let card_width = self.grid.column_width(width);
        let gap = " ".repeat(self.grid.gap);

        for (n, row) in cards.chunks(columns).enumerate() {
            if n > 0 {
                out.push('\n');
            }
            let blocks: Vec<Vec<String>> =
                row.iter().map(|card| self.card_lines(card, card_width)).collect();
            for line in 0..CARD_HEIGHT {
                let joined = blocks
                    .iter()
                    .map(|block| block[line].as_str())
                    .collect::<Vec<_>>()
                    .join(&gap);
                out.push_str(&joined);
                out.push('\n');
            }
        }

        out
    }

    fn card_lines(&self, card: &Card<'_>, width: usize) -> Vec<String> {
        let (top_left, top_right, bottom_left, bottom_right) = if self.card.rounded {
            ('╭', '╮', '╰', '╯')
        } else {
            ('┌', '┐', '└', '┘')
        };
        let span = width.saturating_sub(2);
        let inner = span.saturating_sub(2 * self.card.padding).max(1);
        let pad = " ".repeat(self.card.padding);

        let label = format!("─ {} ", card.index);
        let fill = span.saturating_sub(label.width());
        let top = format!("{top_left}{label}{}{top_right}", "─".repeat(fill));
        let bottom = format!("{bottom_left}{}{bottom_right}", "─".repeat(span));

        let Presentation { filter, button, .. } = card.presentation;
        let faded = card.presentation.is_faded();

        let mut image = ContentStyle::new();
        if faded {
            image.attributes.set(Attribute::Dim);
        }
        if let Filter::Grayscale(_) = filter {
            image.foreground_color = Some(Color::DarkGrey);
        }

        let mut title = ContentStyle::new();
        title.attributes.set(if faded { Attribute::Dim } else { Attribute::Bold });

        let mut action = ContentStyle::new();
        action.foreground_color = Some(button.foreground);
        action.background_color = button.background;

        let body = [
            (format!("[img] {}", card.dish.image_url), image),
            (card.dish.dish_name.clone(), title),
            (format!("[ {} ]", card.presentation.label), action),
        ];

        let mut lines = Vec::with_capacity(CARD_HEIGHT);
        lines.push(top);
        for (text, style) in body {
            lines.push(format!("│{pad}{}{pad}│", self.cell(&text, inner, style)));
        }
        lines.push(bottom);
        lines
    }

    /// Fit `text` into `width` columns: truncate, then align. Only the text
    /// itself is styled, never the padding around it.
    fn cell(&self, text: &str, width: usize, style: ContentStyle) -> String {
        let text = truncate(text, width);
        let free = width.saturating_sub(text.width());
        let (left, right) = if self.card.centered {
            (free / 2, free - free / 2)
        } else {
            (0, free)
        };
        format!(
            "{}{}{}",
            " ".repeat(left),
            self.paint(&text, style),
            " ".repeat(right)
        )
    }

    fn paint(&self, text: &str, style: ContentStyle) -> String {
        if self.styled {
            style.apply(text).to_string()
        } else {
            text.to_string()
        }
    }
}

/// top border, image, name, button, bottom border
const CARD_HEIGHT: usize = 5;

fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}
