use crate::inventory::Stats;
use crate::ui::view::ShortcutInfo;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar with logo, stock counts and shortcuts
pub fn draw_header(
  frame: &mut Frame,
  area: Rect,
  stats: Stats,
  unsaved: bool,
  shortcuts: &[ShortcutInfo],
) {
  let separator = || Span::styled("│", Style::default().fg(Color::DarkGray));

  let mut spans = vec![
    Span::styled(" phonestock ", Style::default().fg(Color::Cyan).bold()),
    separator(),
    Span::styled(
      format!(" {} phones ", stats.total),
      Style::default().fg(Color::White),
    ),
    separator(),
    Span::styled(
      format!(" {} available ", stats.available),
      Style::default().fg(Color::Green),
    ),
    separator(),
    Span::styled(
      format!(" {} sold ", stats.sold),
      Style::default().fg(Color::DarkGray),
    ),
  ];

  if unsaved {
    spans.push(separator());
    spans.push(Span::styled(
      " UNSAVED <w> retry ",
      Style::default().fg(Color::Black).bg(Color::Yellow).bold(),
    ));
  }

  spans.push(Span::raw("  "));
  spans.extend(shortcut_spans(shortcuts));

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}

/// Shortcuts in priority order, keys highlighted and descriptions dimmed
fn shortcut_spans(shortcuts: &[ShortcutInfo]) -> Vec<Span<'static>> {
  let mut sorted: Vec<&ShortcutInfo> = shortcuts.iter().collect();
  sorted.sort_by_key(|s| s.priority);

  let mut spans = Vec::new();
  for (i, shortcut) in sorted.into_iter().enumerate() {
    if i > 0 {
      spans.push(Span::raw("  "));
    }
    spans.push(Span::styled(
      format!("<{}>", shortcut.key),
      Style::default().fg(Color::Cyan),
    ));
    spans.push(Span::styled(
      format!(" {}", shortcut.label),
      Style::default().fg(Color::DarkGray),
    ));
  }
  spans
}
