use chrono::{DateTime, Utc};
use colored::Colorize;
use qrshelf::api::{CmdMessage, MessageLevel};
use qrshelf::index::DisplayItem;
use timeago::Formatter;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const LINE_WIDTH: usize = 100;
const TIME_WIDTH: usize = 14;
const SELECTED_MARKER: &str = "●";

pub(super) fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => println!("{}", message.content.red()),
        }
    }
}

pub(super) fn print_items(items: &[DisplayItem]) {
    if items.is_empty() {
        println!("No codes yet.");
        return;
    }

    for line in items.iter().map(format_item_line) {
        println!("{}", line);
    }
}

fn format_item_line(di: &DisplayItem) -> String {
    let marker = if di.item.is_selected {
        format!("  {} ", SELECTED_MARKER)
    } else {
        "    ".to_string()
    };
    let idx_str = format!("{}. ", di.index);
    let time_ago = di
        .item
        .created_at
        .map(format_time_ago)
        .unwrap_or_else(|| " ".repeat(TIME_WIDTH));

    let text: String = di
        .item
        .text
        .chars()
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect();

    let fixed_width = marker.width() + idx_str.width() + TIME_WIDTH + 2;
    let available = LINE_WIDTH.saturating_sub(fixed_width);
    let text_display = truncate_to_width(&text, available);
    let padding = available.saturating_sub(text_display.width());

    let idx_colored = if di.item.is_selected {
        idx_str.yellow()
    } else {
        idx_str.normal()
    };

    format!(
        "{}{}{}{}  {}",
        marker.yellow(),
        idx_colored,
        text_display,
        " ".repeat(padding),
        time_ago.dimmed()
    )
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }

    let budget = max_width.saturating_sub(1);
    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > budget {
            break;
        }
        result.push(c);
        current_width += char_width;
    }

    result.push('…');
    result
}

fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);
    let time_str = Formatter::new().convert(duration.to_std().unwrap_or_default());
    format!("{:>width$}", time_str, width = TIME_WIDTH)
}
