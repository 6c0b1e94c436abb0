pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use crate::app::Session;
use components::CommandInput;
use ratatui::prelude::*;
use ratatui::widgets::ListState;
use view::View;

/// Main draw function: header, the top view, then the footer or banner
pub fn draw(frame: &mut Frame, views: &mut [Box<dyn View>], session: &Session, command: &CommandInput) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Footer / banner
    ])
    .split(frame.area());

  let store = session.store();
  let shortcuts = views.last().map(|v| v.shortcuts()).unwrap_or_default();
  renderfns::draw_header(frame, chunks[0], store.stats(), store.is_dirty(), &shortcuts);

  // Forms draw over the list they were opened from
  if let Some((top, below)) = views.split_last_mut() {
    if let Some(parent) = below.last_mut() {
      parent.render(frame, chunks[1], session);
    }
    top.render(frame, chunks[1], session);
  }

  command.render_overlay(frame, chunks[1]);

  match session.banner() {
    Some(banner) => renderfns::draw_banner(frame, chunks[2], banner),
    None => {
      let breadcrumb: Vec<String> = views.iter().map(|v| v.breadcrumb_label()).collect();
      renderfns::draw_footer(frame, chunks[2], &breadcrumb);
    }
  }
}

/// Keep a list selection inside `len` items
pub fn ensure_valid_selection(state: &mut ListState, len: usize) {
  match state.selected() {
    _ if len == 0 => state.select(None),
    None => state.select(Some(0)),
    Some(idx) if idx >= len => state.select(Some(len - 1)),
    Some(_) => {}
  }
}
