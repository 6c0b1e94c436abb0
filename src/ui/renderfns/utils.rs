use ratatui::prelude::*;

/// Truncate a string to at most `max_chars` characters, adding "..." if truncated
pub fn truncate(s: &str, max_chars: usize) -> String {
  if s.chars().count() <= max_chars {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Display color for a phone's sale status
pub fn status_color(sold: bool) -> Color {
  if sold {
    Color::DarkGray
  } else {
    Color::Green
  }
}

/// Overlay anchored at the top-left of `area`, like a dropdown
pub fn overlay_rect(area: Rect, height: u16) -> Rect {
  let width = (area.width * 60 / 100).clamp(30, 60).min(area.width);
  let x = area.x + 1;
  let y = area.y + 1;
  Rect::new(x, y, width, height).intersection(area)
}

/// A `percent_x` wide, `height` tall rectangle centered in `area`
pub fn centered_rect(area: Rect, percent_x: u16, height: u16) -> Rect {
  let width = (area.width * percent_x / 100).max(30).min(area.width);
  let height = height.min(area.height);
  Rect::new(
    area.x + (area.width - width) / 2,
    area.y + (area.height - height) / 2,
    width,
    height,
  )
}
