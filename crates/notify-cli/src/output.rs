//! Shared output layer: pretty text for humans, stable JSON for scripts.

use chrono::DateTime;
use notify_core::render::RenderItem;
use serde::Serialize;
use std::io::{self, Write};

/// Shared width for human pretty separators.
pub const PRETTY_RULE_WIDTH: usize = 72;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Pretty,
    Json,
}

impl OutputMode {
    pub fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<12} {}", format!("{key}:"), value.as_ref())
}

/// Serialize `value` as pretty JSON followed by a newline.
pub fn write_json<T: Serialize>(w: &mut dyn Write, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *w, value).map_err(io::Error::other)?;
    writeln!(w)
}

/// One notification line: seen marker, time, text, and countdown if any.
pub fn pretty_item(w: &mut dyn Write, item: &RenderItem) -> io::Result<()> {
    let marker = if item.seen { ' ' } else { '*' };
    let when = DateTime::from_timestamp(item.timestamp, 0).map_or_else(
        || item.timestamp.to_string(),
        |dt| dt.format("%Y-%m-%d %H:%M").to_string(),
    );
    write!(w, "{marker} {when}  {}", item.text)?;
    if let Some(remaining) = &item.remaining {
        write!(w, "  [{remaining}]")?;
    }
    writeln!(w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify_core::model::{NotificationId, NotificationKind};

    fn item(seen: bool, remaining: Option<&str>) -> RenderItem {
        RenderItem {
            id: NotificationId::Dynamic(1),
            kind: NotificationKind::Dynamic,
            text: "Spring sale".to_string(),
            actor: None,
            timestamp: 0,
            seen,
            item_count: 0,
            remaining: remaining.map(str::to_string),
            action: None,
        }
    }

    fn render(item: &RenderItem) -> String {
        let mut buf = Vec::new();
        pretty_item(&mut buf, item).expect("write");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn unseen_items_are_starred() {
        assert_eq!(render(&item(false, None)), "* 1970-01-01 00:00  Spring sale\n");
        assert_eq!(render(&item(true, None)), "  1970-01-01 00:00  Spring sale\n");
    }

    #[test]
    fn countdown_is_appended() {
        assert_eq!(
            render(&item(false, Some("00:00:42"))),
            "* 1970-01-01 00:00  Spring sale  [00:00:42]\n"
        );
    }

    #[test]
    fn kv_pads_key() {
        let mut buf = Vec::new();
        pretty_kv(&mut buf, "unseen", "3").expect("write");
        assert_eq!(String::from_utf8(buf).expect("utf8"), "unseen:      3\n");
    }
}
