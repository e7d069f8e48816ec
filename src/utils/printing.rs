//! Markdown rendering of model replies in the terminal.
//!
//! Replies arrive whole (the lessons block on each request), so there is no incremental
//! rendering here: one reply, one print.

use termimad::{FmtText, MadSkin};

/// Renders a complete reply as markdown with a [MadSkin].
pub struct MarkdownPrinter {
    pub skin: MadSkin,
    pub wrap_width: Option<usize>,
}

impl Default for MarkdownPrinter {
    fn default() -> Self {
        Self {
            skin: MadSkin::default(),
            wrap_width: None,
        }
    }
}

impl MarkdownPrinter {
    /// Render `markdown` to a printable string.
    pub fn render(&self, markdown: &str) -> String {
        format!("{}", FmtText::from(&self.skin, markdown, self.wrap_width))
    }

    /// Render `markdown` and print it to stdout.
    pub fn print(&self, markdown: &str) {
        print!("{}", self.render(markdown));
    }
}

#[cfg(test)]
mod test_printing {
    use super::MarkdownPrinter;

    #[test]
    fn test_render_plain_text() {
        let printer = MarkdownPrinter::default();
        let rendered = printer.render("plain text");
        assert!(rendered.contains("plain text"));
    }
}
