use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;

/// Result of handling a key event in an input component
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputResult {
  /// Key was handled, continue input mode
  Consumed,
  /// Enter pressed, here's the submitted value
  Submitted(String),
  /// Escape pressed, input cancelled
  Cancelled,
  /// Key not handled, pass to next handler
  NotHandled,
}

/// Single-line text input. The cursor counts characters, not bytes.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
  buffer: String,
  cursor: usize,
  /// Characters accepted when typed; everything is accepted when unset
  accept: Option<fn(char) -> bool>,
  max_chars: Option<usize>,
}

impl TextInput {
  pub fn new() -> Self {
    Self::default()
  }

  /// Input pre-filled with `value`, cursor at the end
  pub fn with_value(value: &str) -> Self {
    let mut input = Self::new();
    input.set_value(value);
    input
  }

  /// Only accept characters passing `accept`, at most `max_chars` of them
  pub fn restricted(mut self, accept: fn(char) -> bool, max_chars: usize) -> Self {
    self.accept = Some(accept);
    self.max_chars = Some(max_chars);
    self
  }

  /// Get the current input value
  pub fn value(&self) -> &str {
    &self.buffer
  }

  pub fn set_value(&mut self, value: &str) {
    self.buffer = value.to_string();
    self.cursor = self.char_count();
  }

  /// Check if the input is empty
  pub fn is_empty(&self) -> bool {
    self.buffer.is_empty()
  }

  /// Clear the input
  pub fn clear(&mut self) {
    self.buffer.clear();
    self.cursor = 0;
  }

  fn char_count(&self) -> usize {
    self.buffer.chars().count()
  }

  /// Byte offset of the character at `idx`
  fn byte_at(&self, idx: usize) -> usize {
    self
      .buffer
      .char_indices()
      .nth(idx)
      .map(|(i, _)| i)
      .unwrap_or(self.buffer.len())
  }

  fn insert(&mut self, c: char) {
    if let Some(accept) = self.accept {
      if !accept(c) {
        return;
      }
    }
    if self.max_chars.is_some_and(|max| self.char_count() >= max) {
      return;
    }
    let at = self.byte_at(self.cursor);
    self.buffer.insert(at, c);
    self.cursor += 1;
  }

  /// Handle a key event, returning the result
  pub fn handle_key(&mut self, key: KeyEvent) -> InputResult {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
      KeyCode::Esc => InputResult::Cancelled,
      KeyCode::Enter => InputResult::Submitted(self.buffer.clone()),
      KeyCode::Backspace => {
        if self.cursor > 0 {
          self.cursor -= 1;
          let at = self.byte_at(self.cursor);
          self.buffer.remove(at);
        }
        InputResult::Consumed
      }
      KeyCode::Delete => {
        if self.cursor < self.char_count() {
          let at = self.byte_at(self.cursor);
          self.buffer.remove(at);
        }
        InputResult::Consumed
      }
      KeyCode::Left => {
        self.cursor = self.cursor.saturating_sub(1);
        InputResult::Consumed
      }
      KeyCode::Right => {
        if self.cursor < self.char_count() {
          self.cursor += 1;
        }
        InputResult::Consumed
      }
      KeyCode::Home => {
        self.cursor = 0;
        InputResult::Consumed
      }
      KeyCode::End => {
        self.cursor = self.char_count();
        InputResult::Consumed
      }
      KeyCode::Char('a') if ctrl => {
        self.cursor = 0;
        InputResult::Consumed
      }
      KeyCode::Char('e') if ctrl => {
        self.cursor = self.char_count();
        InputResult::Consumed
      }
      KeyCode::Char('u') if ctrl => {
        // Clear line before cursor
        let at = self.byte_at(self.cursor);
        self.buffer.replace_range(..at, "");
        self.cursor = 0;
        InputResult::Consumed
      }
      KeyCode::Char('w') if ctrl => {
        // Delete word before cursor
        let at = self.byte_at(self.cursor);
        let start = self.buffer[..at]
          .trim_end()
          .rfind(' ')
          .map(|i| i + 1)
          .unwrap_or(0);
        self.buffer.replace_range(start..at, "");
        self.cursor = self.buffer[..start].chars().count();
        InputResult::Consumed
      }
      KeyCode::Char(_) if ctrl => InputResult::NotHandled,
      KeyCode::Char(c) => {
        self.insert(c);
        InputResult::Consumed
      }
      _ => InputResult::NotHandled,
    }
  }

  /// Spans for the value with a block cursor drawn when `focused`
  pub fn spans(&self, focused: bool) -> Vec<Span<'_>> {
    if !focused {
      return vec![Span::raw(self.buffer.as_str())];
    }

    let at = self.byte_at(self.cursor);
    let (before, rest) = self.buffer.split_at(at);
    let mut chars = rest.chars();
    let under = chars.next().map(String::from).unwrap_or_else(|| " ".to_string());
    let cursor_style = Style::default().add_modifier(Modifier::REVERSED);

    vec![
      Span::raw(before),
      Span::styled(under, cursor_style),
      Span::raw(chars.as_str()),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn ctrl_key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::CONTROL)
  }

  fn type_str(input: &mut TextInput, s: &str) {
    for c in s.chars() {
      input.handle_key(key(KeyCode::Char(c)));
    }
  }

  #[test]
  fn test_basic_input() {
    let mut input = TextInput::new();
    assert!(input.is_empty());

    type_str(&mut input, "hi");
    assert_eq!(input.value(), "hi");
  }

  #[test]
  fn test_submit_and_cancel() {
    let mut input = TextInput::new();
    type_str(&mut input, "Pixel");
    assert_eq!(
      input.handle_key(key(KeyCode::Enter)),
      InputResult::Submitted("Pixel".to_string())
    );
    assert_eq!(input.handle_key(key(KeyCode::Esc)), InputResult::Cancelled);
  }

  #[test]
  fn test_cursor_movement_and_backspace() {
    let mut input = TextInput::new();
    type_str(&mut input, "ac");
    input.handle_key(key(KeyCode::Left));
    input.handle_key(key(KeyCode::Char('b')));
    assert_eq!(input.value(), "abc");

    input.handle_key(key(KeyCode::End));
    input.handle_key(key(KeyCode::Backspace));
    assert_eq!(input.value(), "ab");
  }

  #[test]
  fn test_multibyte_characters() {
    let mut input = TextInput::with_value("Café");
    input.handle_key(key(KeyCode::Backspace));
    assert_eq!(input.value(), "Caf");

    let mut input = TextInput::with_value("Motö");
    input.handle_key(key(KeyCode::Left));
    input.handle_key(key(KeyCode::Char('r')));
    assert_eq!(input.value(), "Motrö");
  }

  #[test]
  fn test_ctrl_u_clear_before_cursor() {
    let mut input = TextInput::with_value("hello world");
    for _ in 0..5 {
      input.handle_key(key(KeyCode::Left));
    }
    input.handle_key(ctrl_key(KeyCode::Char('u')));
    assert_eq!(input.value(), "world");
  }

  #[test]
  fn test_ctrl_w_deletes_word() {
    let mut input = TextInput::with_value("Galaxy A54");
    input.handle_key(ctrl_key(KeyCode::Char('w')));
    assert_eq!(input.value(), "Galaxy ");
  }

  #[test]
  fn test_restricted_input() {
    let mut input = TextInput::new().restricted(|c| c.is_ascii_digit(), 4);
    type_str(&mut input, "12a345");
    assert_eq!(input.value(), "1234");
  }
}
