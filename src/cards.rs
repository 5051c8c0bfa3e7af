//! Plain-text rendering of video cards and category chips.

use std::fmt::Write as _;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::category::CategoryDefinition;
use crate::youtube::VideoRecord;

/// Display columns reserved for a card title.
pub const TITLE_WIDTH: usize = 60;

/// Ids the player refuses to embed (placeholder content).
const PLACEHOLDER_IDS: [&str; 3] = ["demo1", "demo2", "demo3"];

/// ANSI styling for one colour scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
  pub name: &'static str,
  pub title: &'static str,
  pub meta: &'static str,
  pub accent: &'static str,
  pub reset: &'static str,
}

pub const LIGHT: Palette =
  Palette { name: "light", title: "\x1b[1;30m", meta: "\x1b[90m", accent: "\x1b[32m", reset: "\x1b[0m" };

pub const DARK: Palette =
  Palette { name: "dark", title: "\x1b[1;97m", meta: "\x1b[37m", accent: "\x1b[92m", reset: "\x1b[0m" };

pub const PLAIN: Palette = Palette { name: "plain", title: "", meta: "", accent: "", reset: "" };

pub fn palette(dark_mode: bool) -> Palette {
  if dark_mode { DARK } else { LIGHT }
}

/// `1234567` → `1.2M`, `4321` → `4.3K`; smaller or unparsable counts pass through.
pub fn format_view_count(count: &str) -> String {
  match count.trim().parse::<u64>() {
    Ok(n) if n >= 1_000_000 => format!("{:.1}M", n as f64 / 1_000_000.0),
    Ok(n) if n >= 1_000 => format!("{:.1}K", n as f64 / 1_000.0),
    _ => count.to_string(),
  }
}

/// Split an ISO-8601 time duration (`PT1H2M3S`) into its hour/minute/second parts.
fn duration_parts(duration: &str) -> Option<(Option<u64>, Option<u64>, Option<u64>)> {
  let rest = duration.strip_prefix("PT")?;
  let (mut hours, mut minutes, mut seconds) = (None, None, None);
  let mut digits = String::new();
  for ch in rest.chars() {
    if ch.is_ascii_digit() {
      digits.push(ch);
      continue;
    }
    let value = digits.parse::<u64>().ok()?;
    digits.clear();
    match ch {
      'H' if hours.is_none() && minutes.is_none() && seconds.is_none() => hours = Some(value),
      'M' if minutes.is_none() && seconds.is_none() => minutes = Some(value),
      'S' if seconds.is_none() => seconds = Some(value),
      _ => return None,
    }
  }
  if !digits.is_empty() {
    return None;
  }
  Some((hours, minutes, seconds))
}

/// `PT1H2M3S` → `1:02:03`, `PT10M32S` → `10:32`; anything unparsable is `0:00`.
pub fn format_duration(duration: &str) -> String {
  let Some((hours, minutes, seconds)) = duration_parts(duration) else {
    return "0:00".to_string();
  };
  let seconds = seconds.unwrap_or(0);
  match hours {
    Some(h) => format!("{}:{:02}:{:02}", h, minutes.unwrap_or(0), seconds),
    None => format!("{}:{:02}", minutes.unwrap_or(0), seconds),
  }
}

pub fn watch_url(id: &str) -> String {
  format!("https://youtube.com/watch?v={}", id)
}

pub fn embed_url(id: &str) -> Option<String> {
  if id.is_empty() || PLACEHOLDER_IDS.contains(&id) {
    return None;
  }
  Some(format!("https://www.youtube.com/embed/{}?rel=0&modestbranding=1", id))
}

/// Truncate to `max` display columns, marking the cut with `…`.
pub fn truncate_width(text: &str, max: usize) -> String {
  if text.width() <= max {
    return text.to_string();
  }
  let budget = max.saturating_sub(1);
  let mut used = 0;
  let mut out = String::new();
  for ch in text.chars() {
    let w = ch.width().unwrap_or(0);
    if used + w > budget {
      break;
    }
    used += w;
    out.push(ch);
  }
  out.push('…');
  out
}

pub fn render_card(index: usize, video: &VideoRecord, p: &Palette) -> String {
  let mut out = String::new();
  let title = truncate_width(&video.title, TITLE_WIDTH);
  let _ = writeln!(out, "{}{:>2}.{} {}{}{}", p.accent, index, p.reset, p.title, title, p.reset);
  let _ = writeln!(
    out,
    "    {}{} · {} views · {}{}",
    p.meta,
    video.channel_title,
    format_view_count(&video.view_count),
    format_duration(&video.duration),
    p.reset
  );
  let _ = writeln!(out, "    {}", watch_url(&video.id));
  if let Some(thumb) = video.thumbnails.best() {
    let _ = writeln!(out, "    {}thumbnail: {}{}", p.meta, thumb.url, p.reset);
  }
  if let Some(embed) = embed_url(&video.id) {
    let _ = writeln!(out, "    {}embed: {}{}", p.meta, embed, p.reset);
  }
  out
}

pub fn render_cards<'a>(videos: impl IntoIterator<Item = &'a VideoRecord>, p: &Palette) -> String {
  videos.into_iter().enumerate().map(|(i, v)| render_card(i + 1, v, p)).collect::<Vec<_>>().join("\n")
}

pub fn render_category(category: &CategoryDefinition, p: &Palette) -> String {
  let trending = if category.trending { " 🔥" } else { "" };
  format!("{} {}{:<14}{} {}{}", category.icon, p.accent, category.id, p.reset, category.name, trending)
}
