use ratatui::prelude::Color;

use crate::api::types::CharacterStatus;

/// Tailwind emerald-600, the accent used for living characters
pub const EMERALD: Color = Color::Rgb(5, 150, 105);

/// Truncate a string to at most `max_chars` characters, adding "..." if truncated
pub fn truncate(s: &str, max_chars: usize) -> String {
  if s.chars().count() <= max_chars {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// How a character status is drawn: icon, label and color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPresentation {
  pub icon: &'static str,
  pub label: &'static str,
  pub color: Color,
}

pub fn status_presentation(status: CharacterStatus) -> StatusPresentation {
  match status {
    CharacterStatus::Alive => StatusPresentation {
      icon: "♥",
      label: CharacterStatus::Alive.as_str(),
      color: EMERALD,
    },
    CharacterStatus::Dead => StatusPresentation {
      icon: "☠",
      label: CharacterStatus::Dead.as_str(),
      color: Color::Red,
    },
    CharacterStatus::Unknown => StatusPresentation {
      icon: "?",
      label: CharacterStatus::Unknown.as_str(),
      color: Color::Gray,
    },
  }
}
