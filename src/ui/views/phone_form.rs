use crate::app::Session;
use crate::inventory::{
  image, NewPhone, PhoneRecord, PhoneUpdate, Ram, RecordId, Storage, StoreError,
};
use crate::ui::components::{BannerKind, TextInput};
use crate::ui::renderfns::centered_rect;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use std::path::Path;

const IMEI_LEN: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
  Brand,
  Model,
  Imei,
  Ram,
  Storage,
  Photo,
}

const FIELDS: [Field; 6] = [
  Field::Brand,
  Field::Model,
  Field::Imei,
  Field::Ram,
  Field::Storage,
  Field::Photo,
];

impl Field {
  fn label(self) -> &'static str {
    match self {
      Field::Brand => "Brand",
      Field::Model => "Model",
      Field::Imei => "IMEI",
      Field::Ram => "RAM",
      Field::Storage => "Storage",
      Field::Photo => "Photo file",
    }
  }
}

#[derive(Debug, Clone, Copy)]
enum Target {
  New,
  Existing { id: RecordId, has_photo: bool },
}

/// Form for adding a phone or editing one in place.
///
/// Rejected input stays in the form so it can be corrected.
pub struct PhoneFormView {
  target: Target,
  brand: TextInput,
  model: TextInput,
  imei: TextInput,
  ram: Ram,
  storage: Storage,
  /// Path of a photo to attach
  photo: TextInput,
  remove_photo: bool,
  focus: usize,
  error: Option<String>,
}

impl PhoneFormView {
  fn blank(target: Target) -> Self {
    Self {
      target,
      brand: TextInput::new(),
      model: TextInput::new(),
      imei: TextInput::new().restricted(|c| c.is_ascii_digit(), IMEI_LEN),
      ram: Ram::Gb2,
      storage: Storage::Gb16,
      photo: TextInput::new(),
      remove_photo: false,
      focus: 0,
      error: None,
    }
  }

  pub fn add() -> Self {
    Self::blank(Target::New)
  }

  pub fn edit(record: &PhoneRecord) -> Self {
    let mut form = Self::blank(Target::Existing {
      id: record.id,
      has_photo: record.image.is_some(),
    });
    form.brand = TextInput::with_value(&record.brand);
    form.model = TextInput::with_value(&record.model);
    form.imei.set_value(record.imei.as_str());
    form.ram = record.ram;
    form.storage = record.storage;
    form
  }

  fn focused(&self) -> Field {
    FIELDS[self.focus % FIELDS.len()]
  }

  fn input_mut(&mut self, field: Field) -> Option<&mut TextInput> {
    match field {
      Field::Brand => Some(&mut self.brand),
      Field::Model => Some(&mut self.model),
      Field::Imei => Some(&mut self.imei),
      Field::Photo => Some(&mut self.photo),
      Field::Ram | Field::Storage => None,
    }
  }

  fn cycle(&mut self, forward: bool) {
    match self.focused() {
      Field::Ram => self.ram = if forward { self.ram.next() } else { self.ram.prev() },
      Field::Storage => {
        self.storage = if forward {
          self.storage.next()
        } else {
          self.storage.prev()
        }
      }
      _ => {}
    }
  }

  fn photo_data_url(&self, max_bytes: u64) -> Result<Option<String>, StoreError> {
    let path = self.photo.value().trim();
    if path.is_empty() || self.remove_photo {
      return Ok(None);
    }
    image::load_data_url(Path::new(path), max_bytes).map(Some)
  }

  fn reject(&mut self, err: StoreError, session: &mut Session) -> ViewAction {
    self.error = Some(err.to_string());
    session.report_error(&err);
    ViewAction::None
  }

  fn submit(&mut self, session: &mut Session) -> ViewAction {
    let photo = match self.photo_data_url(session.max_image_bytes()) {
      Ok(photo) => photo,
      Err(e) => return self.reject(e, session),
    };

    let result = match self.target {
      Target::New => session
        .store_mut()
        .add(NewPhone {
          brand: self.brand.value().to_string(),
          model: self.model.value().to_string(),
          imei: self.imei.value().to_string(),
          ram: self.ram,
          storage: self.storage,
          image: photo,
        })
        .map(|record| Some(("Added", record))),
      Target::Existing { id, .. } => session
        .store_mut()
        .update(
          id,
          PhoneUpdate {
            brand: Some(self.brand.value().to_string()),
            model: Some(self.model.value().to_string()),
            imei: Some(self.imei.value().to_string()),
            ram: Some(self.ram),
            storage: Some(self.storage),
            image: photo,
            clear_image: self.remove_photo,
          },
        )
        .map(|record| record.map(|r| ("Saved", r))),
    };

    match result {
      Ok(Some((done, record))) => {
        session.notify(
          BannerKind::Success,
          format!("{} {} {}", done, record.brand, record.model),
        );
        ViewAction::Pop
      }
      Ok(None) => {
        session.notify(BannerKind::Error, "That phone is no longer in the inventory");
        ViewAction::Pop
      }
      // The change is in memory; only the write failed
      Err(e @ StoreError::Storage(_)) => {
        session.report_error(&e);
        ViewAction::Pop
      }
      Err(e) => self.reject(e, session),
    }
  }

  fn field_line(&self, field: Field) -> Line<'_> {
    let focused = self.focused() == field;
    let label_style = if focused {
      Style::default().fg(Color::Yellow).bold()
    } else {
      Style::default().fg(Color::DarkGray)
    };
    let mut spans = vec![Span::styled(format!(" {:<11}", field.label()), label_style)];

    let option = |label: &'static str| {
      if focused {
        vec![
          Span::styled("< ", Style::default().fg(Color::Cyan)),
          Span::raw(label),
          Span::styled(" >", Style::default().fg(Color::Cyan)),
        ]
      } else {
        vec![Span::raw(format!("  {}", label))]
      }
    };

    match field {
      Field::Brand => spans.extend(self.brand.spans(focused)),
      Field::Model => spans.extend(self.model.spans(focused)),
      Field::Imei => {
        spans.extend(self.imei.spans(focused));
        spans.push(Span::styled(
          format!("  {}/{}", self.imei.value().len(), IMEI_LEN),
          Style::default().fg(Color::DarkGray),
        ));
      }
      Field::Ram => spans.extend(option(self.ram.label())),
      Field::Storage => spans.extend(option(self.storage.label())),
      Field::Photo => {
        if self.remove_photo {
          spans.push(Span::styled(
            "photo will be removed",
            Style::default().fg(Color::Red),
          ));
        } else {
          spans.extend(self.photo.spans(focused));
          if self.photo.is_empty() {
            let hint = match self.target {
              Target::Existing { has_photo: true, .. } => "  keeps current photo",
              _ => "  optional",
            };
            spans.push(Span::styled(hint, Style::default().fg(Color::DarkGray)));
          }
        }
      }
    }

    Line::from(spans)
  }
}

impl View for PhoneFormView {
  fn handle_key(&mut self, key: KeyEvent, session: &mut Session) -> ViewAction {
    match key.code {
      KeyCode::Esc => return ViewAction::Pop,
      KeyCode::Enter => return self.submit(session),
      KeyCode::Tab | KeyCode::Down => {
        self.focus = (self.focus + 1) % FIELDS.len();
        return ViewAction::None;
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.focus = (self.focus + FIELDS.len() - 1) % FIELDS.len();
        return ViewAction::None;
      }
      _ => {}
    }

    let field = self.focused();
    match (field, key.code) {
      (Field::Ram | Field::Storage, KeyCode::Left | KeyCode::Char('h')) => self.cycle(false),
      (Field::Ram | Field::Storage, KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ')) => {
        self.cycle(true)
      }
      (Field::Photo, KeyCode::Char('d')) if key.modifiers.contains(KeyModifiers::CONTROL) => {
        if matches!(self.target, Target::Existing { has_photo: true, .. }) {
          self.remove_photo = !self.remove_photo;
        }
      }
      _ => {
        if let Some(input) = self.input_mut(field) {
          input.handle_key(key);
        }
      }
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, _session: &Session) {
    let title = match self.target {
      Target::New => " Add phone ".to_string(),
      Target::Existing { id, .. } => format!(" Edit phone {} ", id),
    };
    let dialog = centered_rect(area, 60, 12);
    frame.render_widget(Clear, dialog);

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow));

    let mut lines: Vec<Line> = FIELDS.iter().map(|f| self.field_line(*f)).collect();
    lines.push(Line::raw(""));
    match &self.error {
      Some(error) => lines.push(Line::styled(
        format!(" {}", error),
        Style::default().fg(Color::Red),
      )),
      None => lines.push(Line::raw("")),
    }

    let mut help = vec![Span::styled(
      " <tab> next  <enter> save  <esc> cancel  <←/→> change option",
      Style::default().fg(Color::DarkGray),
    )];
    if matches!(self.target, Target::Existing { has_photo: true, .. }) {
      help.push(Span::styled(
        "  <ctrl-d> remove photo",
        Style::default().fg(Color::DarkGray),
      ));
    }
    lines.push(Line::from(help));

    frame.render_widget(Paragraph::new(lines).block(block), dialog);
  }

  fn breadcrumb_label(&self) -> String {
    match self.target {
      Target::New => "Add phone".to_string(),
      Target::Existing { id, .. } => format!("Edit {}", id),
    }
  }

  fn captures_input(&self) -> bool {
    true
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("tab", "next field").with_priority(10),
      ShortcutInfo::new("enter", "save").with_priority(20),
      ShortcutInfo::new("esc", "cancel").with_priority(30),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::app::tests::{phone, session};

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn type_str(form: &mut PhoneFormView, session: &mut Session, s: &str) {
    for c in s.chars() {
      form.handle_key(key(KeyCode::Char(c)), session);
    }
  }

  fn fill(form: &mut PhoneFormView, session: &mut Session, brand: &str, model: &str, imei: &str) {
    type_str(form, session, brand);
    form.handle_key(key(KeyCode::Tab), session);
    type_str(form, session, model);
    form.handle_key(key(KeyCode::Tab), session);
    type_str(form, session, imei);
  }

  #[test]
  fn test_add_phone() {
    let mut session = session();
    let mut form = PhoneFormView::add();
    fill(&mut form, &mut session, "Samsung", "Galaxy A54", "123456789012345");
    // RAM: 2GB -> 3GB -> 4GB
    form.handle_key(key(KeyCode::Tab), &mut session);
    form.handle_key(key(KeyCode::Right), &mut session);
    form.handle_key(key(KeyCode::Right), &mut session);
    // Storage: 16GB -> 1TB
    form.handle_key(key(KeyCode::Tab), &mut session);
    form.handle_key(key(KeyCode::Left), &mut session);

    let action = form.handle_key(key(KeyCode::Enter), &mut session);
    assert!(matches!(action, ViewAction::Pop));

    let record = &session.store().records()[0];
    assert_eq!(record.brand, "Samsung");
    assert_eq!(record.ram, Ram::Gb4);
    assert_eq!(record.storage, Storage::Tb1);
    assert!(!record.sold);
  }

  #[test]
  fn test_invalid_imei_keeps_input() {
    let mut session = session();
    let mut form = PhoneFormView::add();
    fill(&mut form, &mut session, "Samsung", "Galaxy A54", "12345");

    let action = form.handle_key(key(KeyCode::Enter), &mut session);
    assert!(matches!(action, ViewAction::None));
    assert!(session.store().is_empty());
    assert!(form.error.is_some());
    assert_eq!(form.brand.value(), "Samsung");
    assert_eq!(form.imei.value(), "12345");
    assert_eq!(session.banner().map(|b| b.kind()), Some(BannerKind::Error));
  }

  #[test]
  fn test_duplicate_imei_rejected() {
    let mut session = session();
    session
      .store_mut()
      .add(phone("Apple", "123456789012345"))
      .unwrap();

    let mut form = PhoneFormView::add();
    fill(&mut form, &mut session, "Samsung", "Galaxy A54", "123456789012345");
    let action = form.handle_key(key(KeyCode::Enter), &mut session);
    assert!(matches!(action, ViewAction::None));
    assert_eq!(session.store().len(), 1);
  }

  #[test]
  fn test_imei_field_takes_digits_only() {
    let mut session = session();
    let mut form = PhoneFormView::add();
    form.handle_key(key(KeyCode::Tab), &mut session);
    form.handle_key(key(KeyCode::Tab), &mut session);
    type_str(&mut form, &mut session, "12-34 abc 5678901234567");
    assert_eq!(form.imei.value(), "123456789012345");
  }

  #[test]
  fn test_edit_keeps_id() {
    let mut session = session();
    let original = session
      .store_mut()
      .add(phone("Samsung", "123456789012345"))
      .unwrap();

    let mut form = PhoneFormView::edit(&original);
    form.handle_key(key(KeyCode::Tab), &mut session);
    form.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL), &mut session);
    type_str(&mut form, &mut session, "Galaxy S24");

    let action = form.handle_key(key(KeyCode::Enter), &mut session);
    assert!(matches!(action, ViewAction::Pop));

    let updated = session.store().get(original.id).unwrap();
    assert_eq!(updated.model, "Galaxy S24");
    assert_eq!(updated.imei, original.imei);
  }

  #[test]
  fn test_escape_cancels() {
    let mut session = session();
    let mut form = PhoneFormView::add();
    type_str(&mut form, &mut session, "Nokia");
    assert!(matches!(
      form.handle_key(key(KeyCode::Esc), &mut session),
      ViewAction::Pop
    ));
    assert!(session.store().is_empty());
  }

  #[test]
  fn test_missing_photo_file_rejected() {
    let mut session = session();
    let mut form = PhoneFormView::add();
    fill(&mut form, &mut session, "Samsung", "Galaxy A54", "123456789012345");
    for _ in 0..3 {
      form.handle_key(key(KeyCode::Tab), &mut session);
    }
    type_str(&mut form, &mut session, "/no/such/photo.png");

    let action = form.handle_key(key(KeyCode::Enter), &mut session);
    assert!(matches!(action, ViewAction::None));
    assert!(session.store().is_empty());
  }
}
