use crate::app::Session;
use crate::inventory::{ExportFormat, PhoneRecord, RecordId};
use crate::ui::components::{
  answer, BannerKind, ConfirmDialog, ConfirmEvent, KeyResult, SearchEvent, SearchInput,
};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{status_color, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::PhoneFormView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Destructive action waiting for a yes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
  Sell(RecordId),
  Delete(RecordId),
}

/// The stock list: browse, search, and act on phones
pub struct InventoryView {
  list_state: ListState,
  search: SearchInput,
  confirm: Option<ConfirmDialog<Pending>>,
}

impl InventoryView {
  pub fn new() -> Self {
    Self {
      list_state: ListState::default(),
      search: SearchInput::new(),
      confirm: None,
    }
  }

  fn visible<'a>(&self, session: &'a Session) -> Vec<&'a PhoneRecord> {
    session.store().find(self.search.query())
  }

  fn selected(&self, session: &Session) -> Option<PhoneRecord> {
    let idx = self.list_state.selected()?;
    self.visible(session).get(idx).map(|r| (*r).clone())
  }

  fn move_selection(&mut self, session: &Session, delta: isize) {
    let len = self.visible(session).len();
    if len == 0 {
      self.list_state.select(None);
      return;
    }
    let current = self.list_state.selected().unwrap_or(0) as isize;
    let next = (current + delta).clamp(0, len as isize - 1);
    self.list_state.select(Some(next as usize));
  }

  fn ask_sell(&mut self, session: &mut Session) {
    let Some(record) = self.selected(session) else {
      return;
    };
    if record.sold {
      session.notify(
        BannerKind::Info,
        format!("{} {} is already sold", record.brand, record.model),
      );
      return;
    }
    self.confirm = Some(ConfirmDialog::new(
      "Mark as sold",
      format!(
        "Mark {} {} (IMEI {}) as sold? This cannot be undone.",
        record.brand, record.model, record.imei
      ),
      Pending::Sell(record.id),
    ));
  }

  fn ask_delete(&mut self, session: &Session) {
    let Some(record) = self.selected(session) else {
      return;
    };
    self.confirm = Some(ConfirmDialog::new(
      "Delete phone",
      format!(
        "Delete {} {} (IMEI {}) from the inventory?",
        record.brand, record.model, record.imei
      ),
      Pending::Delete(record.id),
    ));
  }

  fn resolve(&mut self, event: ConfirmEvent<Pending>, session: &mut Session) {
    let (result, done) = match event {
      ConfirmEvent::Cancelled => return,
      ConfirmEvent::Confirmed(Pending::Sell(id), confirmation) => {
        (session.store_mut().mark_sold(id, confirmation), "Sold")
      }
      ConfirmEvent::Confirmed(Pending::Delete(id), confirmation) => {
        (session.store_mut().delete(id, confirmation), "Deleted")
      }
    };

    match result {
      Ok(Some(record)) => session.notify(
        BannerKind::Success,
        format!("{}: {} {}", done, record.brand, record.model),
      ),
      Ok(None) => session.notify(BannerKind::Error, "That phone is no longer in the inventory"),
      Err(e) => session.report_error(&e),
    }
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect, session: &Session) {
    let records = self.visible(session);
    ensure_valid_selection(&mut self.list_state, records.len());

    let query = self.search.query();
    let title = if query.is_empty() {
      format!(" Inventory ({}) ", session.store().len())
    } else {
      format!(
        " Inventory ({} of {}) /{} ",
        records.len(),
        session.store().len(),
        query
      )
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if records.is_empty() {
      let content = if session.store().is_empty() {
        "No phones in stock. Press 'a' to add one.".to_string()
      } else {
        format!("No phones match '{}'. Press Esc to clear the search.", query)
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Length(1), Constraint::Min(0)])
      .split(inner);

    let heading = format!(
      "  {:<28} {:<15} {:<13} {:<9} {:<10} {}",
      "PHONE", "IMEI", "RAM/STORAGE", "STATUS", "ADDED", "PHOTO"
    );
    frame.render_widget(
      Paragraph::new(heading).style(Style::default().fg(Color::DarkGray).bold()),
      chunks[0],
    );

    let items: Vec<ListItem> = records
      .iter()
      .map(|record| {
        let name = format!("{} {}", record.brand, record.model);
        let capacity = format!("{}/{}", record.ram, record.storage);
        let line = Line::from(vec![
          Span::styled(
            format!("{:<28}", truncate(&name, 28)),
            Style::default().fg(Color::White),
          ),
          Span::raw(" "),
          Span::styled(
            format!("{:<15}", record.imei),
            Style::default().fg(Color::Cyan),
          ),
          Span::raw(" "),
          Span::raw(format!("{:<13}", capacity)),
          Span::raw(" "),
          Span::styled(
            format!("{:<9}", record.status_label()),
            Style::default().fg(status_color(record.sold)),
          ),
          Span::raw(" "),
          Span::styled(
            format!("{:<10}", record.id.added_date()),
            Style::default().fg(Color::DarkGray),
          ),
          Span::raw(" "),
          Span::raw(if record.image.is_some() { "yes" } else { "" }),
        ]);
        ListItem::new(line)
      })
      .collect();

    let list = List::new(items)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, chunks[1], &mut self.list_state);
  }
}

impl Default for InventoryView {
  fn default() -> Self {
    Self::new()
  }
}

impl View for InventoryView {
  fn handle_key(&mut self, key: KeyEvent, session: &mut Session) -> ViewAction {
    // An open dialog takes every key
    match answer(&mut self.confirm, key) {
      KeyResult::Event(event) => {
        self.resolve(event, session);
        return ViewAction::None;
      }
      KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match self.search.handle_key(key) {
      KeyResult::Event(SearchEvent::Changed(_)) => {
        self.list_state.select(Some(0));
        return ViewAction::None;
      }
      KeyResult::Event(SearchEvent::Submitted) | KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.move_selection(session, 1),
      KeyCode::Char('k') | KeyCode::Up => self.move_selection(session, -1),
      KeyCode::Char('g') | KeyCode::Home => self.move_selection(session, isize::MIN / 2),
      KeyCode::Char('G') | KeyCode::End => self.move_selection(session, isize::MAX / 2),
      KeyCode::Char('a') => return ViewAction::Push(Box::new(PhoneFormView::add())),
      KeyCode::Char('e') | KeyCode::Enter => {
        if let Some(record) = self.selected(session) {
          return ViewAction::Push(Box::new(PhoneFormView::edit(&record)));
        }
      }
      KeyCode::Char('s') => self.ask_sell(session),
      KeyCode::Char('d') | KeyCode::Delete => self.ask_delete(session),
      KeyCode::Char('x') => session.export(ExportFormat::Json),
      KeyCode::Char('X') => session.export(ExportFormat::Csv),
      KeyCode::Char('w') => session.retry_write(),
      KeyCode::Esc => {
        if !self.search.query().is_empty() {
          self.search.clear();
          self.list_state.select(Some(0));
        }
      }
      KeyCode::Char('q') => return ViewAction::Quit,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, session: &Session) {
    self.render_list(frame, area, session);
    self.search.render_overlay(frame, area);
    if let Some(dialog) = &self.confirm {
      dialog.render(frame, area);
    }
  }

  fn breadcrumb_label(&self) -> String {
    "Inventory".to_string()
  }

  fn captures_input(&self) -> bool {
    self.search.is_active() || self.confirm.is_some()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("a", "add").with_priority(10),
      ShortcutInfo::new("e", "edit").with_priority(20),
      ShortcutInfo::new("s", "sold").with_priority(30),
      ShortcutInfo::new("d", "delete").with_priority(40),
      ShortcutInfo::new("/", "search").with_priority(50),
      ShortcutInfo::new("x/X", "export json/csv").with_priority(60),
      ShortcutInfo::new(":", "command").with_priority(70),
      ShortcutInfo::new("q", "quit").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::app::tests::{phone, session};
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn stocked_session() -> Session {
    let mut session = session();
    session
      .store_mut()
      .add(phone("Samsung", "123456789012345"))
      .unwrap();
    session
      .store_mut()
      .add(phone("Apple", "987654321098765"))
      .unwrap();
    session
  }

  #[test]
  fn test_sell_requires_confirmation() {
    let mut session = stocked_session();
    let mut view = InventoryView::new();
    view.list_state.select(Some(0));

    view.handle_key(key(KeyCode::Char('s')), &mut session);
    assert!(view.captures_input());
    assert_eq!(session.store().stats().sold, 0);

    view.handle_key(key(KeyCode::Char('y')), &mut session);
    assert!(!view.captures_input());
    assert_eq!(session.store().stats().sold, 1);
    assert_eq!(session.banner().map(|b| b.kind()), Some(BannerKind::Success));
  }

  #[test]
  fn test_declined_delete_keeps_phone() {
    let mut session = stocked_session();
    let mut view = InventoryView::new();
    view.list_state.select(Some(1));

    view.handle_key(key(KeyCode::Char('d')), &mut session);
    view.handle_key(key(KeyCode::Char('n')), &mut session);
    assert_eq!(session.store().len(), 2);

    view.handle_key(key(KeyCode::Char('d')), &mut session);
    view.handle_key(key(KeyCode::Enter), &mut session);
    assert_eq!(session.store().len(), 1);
    assert_eq!(session.store().records()[0].brand, "Samsung");
  }

  #[test]
  fn test_search_narrows_selection() {
    let mut session = stocked_session();
    let mut view = InventoryView::new();

    for c in "/appl".chars() {
      view.handle_key(key(KeyCode::Char(c)), &mut session);
    }
    view.handle_key(key(KeyCode::Enter), &mut session);
    assert_eq!(view.visible(&session).len(), 1);
    assert_eq!(
      view.selected(&session).map(|r| r.brand),
      Some("Apple".to_string())
    );

    view.handle_key(key(KeyCode::Esc), &mut session);
    assert_eq!(view.visible(&session).len(), 2);
  }

  #[test]
  fn test_selling_sold_phone_needs_no_dialog() {
    let mut session = stocked_session();
    let mut view = InventoryView::new();
    view.list_state.select(Some(0));
    view.handle_key(key(KeyCode::Char('s')), &mut session);
    view.handle_key(key(KeyCode::Char('y')), &mut session);

    view.handle_key(key(KeyCode::Char('s')), &mut session);
    assert!(view.confirm.is_none());
    assert_eq!(session.banner().map(|b| b.kind()), Some(BannerKind::Info));
  }

  #[test]
  fn test_navigation_is_clamped() {
    let mut session = stocked_session();
    let mut view = InventoryView::new();
    view.handle_key(key(KeyCode::Char('k')), &mut session);
    assert_eq!(view.list_state.selected(), Some(0));
    view.handle_key(key(KeyCode::Char('G')), &mut session);
    assert_eq!(view.list_state.selected(), Some(1));
    view.handle_key(key(KeyCode::Char('j')), &mut session);
    assert_eq!(view.list_state.selected(), Some(1));
  }

  #[test]
  fn test_add_and_quit_actions() {
    let mut session = session();
    let mut view = InventoryView::new();
    assert!(matches!(
      view.handle_key(key(KeyCode::Char('a')), &mut session),
      ViewAction::Push(_)
    ));
    assert!(matches!(
      view.handle_key(key(KeyCode::Char('q')), &mut session),
      ViewAction::Quit
    ));
  }
}
