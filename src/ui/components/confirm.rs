use super::KeyResult;
use crate::inventory::Confirmation;
use crate::ui::renderfns::centered_rect;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// Answer from a confirmation dialog
#[derive(Debug)]
pub enum ConfirmEvent<T> {
  /// The user said yes to `T`
  Confirmed(T, Confirmation),
  Cancelled,
}

/// Modal yes/no question guarding a destructive action `T`.
///
/// Saying yes is the only way the UI obtains a `Confirmation`.
#[derive(Debug, Clone)]
pub struct ConfirmDialog<T> {
  title: String,
  message: String,
  pending: T,
}

impl<T> ConfirmDialog<T> {
  pub fn new(title: impl Into<String>, message: impl Into<String>, pending: T) -> Self {
    Self {
      title: title.into(),
      message: message.into(),
      pending,
    }
  }

  /// Consumes the dialog once the user answers
  pub fn handle_key(self, key: KeyEvent) -> Result<ConfirmEvent<T>, Self> {
    match key.code {
      KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => Ok(ConfirmEvent::Confirmed(
        self.pending,
        Confirmation::by_user(),
      )),
      KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Ok(ConfirmEvent::Cancelled),
      _ => Err(self),
    }
  }

  pub fn render(&self, frame: &mut Frame, area: Rect) {
    let dialog = centered_rect(area, 50, 7);
    frame.render_widget(Clear, dialog);

    let block = Block::default()
      .title(format!(" {} ", self.title))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Red));

    let text = vec![
      Line::from(self.message.as_str()),
      Line::raw(""),
      Line::from(vec![
        Span::styled("<y>", Style::default().fg(Color::Cyan)),
        Span::styled(" yes   ", Style::default().fg(Color::DarkGray)),
        Span::styled("<n>", Style::default().fg(Color::Cyan)),
        Span::styled(" no", Style::default().fg(Color::DarkGray)),
      ]),
    ];

    let paragraph = Paragraph::new(text)
      .block(block)
      .alignment(Alignment::Center)
      .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, dialog);
  }
}

/// Route a key to an open dialog, putting it back if the key was not an answer
pub fn answer<T>(dialog: &mut Option<ConfirmDialog<T>>, key: KeyEvent) -> KeyResult<ConfirmEvent<T>> {
  let Some(open) = dialog.take() else {
    return KeyResult::NotHandled;
  };
  match open.handle_key(key) {
    Ok(event) => KeyResult::Event(event),
    Err(still_open) => {
      *dialog = Some(still_open);
      KeyResult::Handled
    }
  }
}
