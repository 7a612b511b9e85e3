//! Line-oriented rendering of the chat view.
//!
//! The terminal shows a window of `rows` message lines.  Each line counts
//! as [`LINE_HEIGHT`] units when reported to the scroll anchor, so the
//! anchor threshold keeps its meaning of "about four lines".

use std::ops::Range;

use roomline_client::{ChatView, RenderedMessage, ScrollCommand, Viewport};
use roomline_shared::types::millis_to_datetime;

pub const LINE_HEIGHT: f64 = 20.0;

#[derive(Debug, Clone)]
pub struct Pager {
    rows: usize,
    total: usize,
    /// Index of the first visible line.
    top: usize,
}

impl Pager {
    pub fn new(rows: usize) -> Self {
        Self {
            rows: rows.max(1),
            total: 0,
            top: 0,
        }
    }

    fn max_top(&self) -> usize {
        self.total.saturating_sub(self.rows)
    }

    pub fn set_total(&mut self, total: usize) {
        self.total = total;
        self.top = self.top.min(self.max_top());
    }

    pub fn apply(&mut self, command: ScrollCommand) {
        if command == ScrollCommand::ScrollToBottom {
            self.top = self.max_top();
        }
    }

    pub fn page_up(&mut self) {
        self.top = self.top.saturating_sub(self.rows);
    }

    pub fn page_down(&mut self) {
        self.top = (self.top + self.rows).min(self.max_top());
    }

    pub fn viewport(&self) -> Viewport {
        Viewport {
            offset: self.top as f64 * LINE_HEIGHT,
            viewport_height: self.rows as f64 * LINE_HEIGHT,
            content_height: self.total as f64 * LINE_HEIGHT,
        }
    }

    pub fn visible(&self) -> Range<usize> {
        self.top..(self.top + self.rows).min(self.total)
    }
}

pub fn format_message(message: &RenderedMessage) -> String {
    let item = &message.item;
    let time = millis_to_datetime(item.created_at)
        .with_timezone(&chrono::Local)
        .format("%H:%M");
    let author = if message.mine { "you" } else { item.nickname.as_str() };

    let mut line = format!("[{time}] {author}: {}", item.text.as_deref().unwrap_or(""));
    match item.attachments.len() {
        0 => {}
        1 => line.push_str(" [1 image]"),
        n => line.push_str(&format!(" [{n} images]")),
    }
    if let Some(mark) = message.mark {
        line.push(' ');
        line.push_str(mark.symbol());
    }
    line
}

pub fn render(view: &ChatView, pager: &Pager) -> String {
    let mut out = String::new();

    let online: Vec<&str> = view.online.iter().map(|u| u.nickname.as_str()).collect();
    out.push_str(&format!(
        "── online: {} ({} offline) ──\n",
        online.join(", "),
        view.offline.len()
    ));

    for message in &view.messages[pager.visible()] {
        out.push_str(&format_message(message));
        out.push('\n');
    }

    if view.show_jump_to_bottom {
        out.push_str("── more below, /bottom to jump ──\n");
    }
    if !view.staged.is_empty() {
        out.push_str(&format!("── {} image(s) staged ──\n", view.staged.len()));
    }
    if let Some(error) = &view.error {
        out.push_str(&format!("!! {error}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pager_follows_the_bottom() {
        let mut pager = Pager::new(3);
        pager.set_total(10);
        pager.apply(ScrollCommand::ScrollToBottom);
        assert_eq!(pager.visible(), 7..10);
        assert_eq!(pager.viewport().offset, 140.0);

        pager.page_up();
        assert_eq!(pager.visible(), 4..7);
        pager.set_total(11);
        pager.apply(ScrollCommand::Hold);
        assert_eq!(pager.visible(), 4..7);

        pager.page_down();
        pager.page_down();
        assert_eq!(pager.visible(), 8..11);
    }

    #[test]
    fn short_history_fits_on_screen() {
        let mut pager = Pager::new(20);
        pager.set_total(2);
        pager.page_up();
        assert_eq!(pager.visible(), 0..2);
        assert_eq!(pager.viewport().distance_from_bottom(), 0.0);
    }
}
