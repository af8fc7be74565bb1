use std::io::Write;

use crossterm::{cursor, queue, style, terminal};

use crate::config::KeyBindings;

/// Menu entries for the player's key bindings, keys in brackets.
pub fn player_items(keys: &KeyBindings) -> Vec<String> {
    vec![
        format!("[{}] pause", keys.pause),
        format!("[{}] reload", keys.reload),
        format!("[{}][{}] quit", keys.quit, keys.quit_alt),
        format!("[{}] full", keys.fullscreen),
    ]
}

/// Draw the menu bar on row `y`, items separated by two spaces.
pub fn print_menubar<W: Write>(out: &mut W, y: u16, items: &[String]) -> anyhow::Result<()> {
    queue!(
        out,
        cursor::MoveTo(0, y),
        terminal::Clear(terminal::ClearType::CurrentLine),
        style::Print(" "),
    )?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            queue!(out, style::Print("  "))?;
        }
        print_menu_item(out, item)?;
    }
    Ok(())
}

/// Print a menu item string, bolding any text inside `[...]` brackets.
/// Text outside brackets is printed dim.
pub fn print_menu_item<W: Write>(out: &mut W, item: &str) -> anyhow::Result<()> {
    for (text, key) in split_keys(item) {
        let attribute = if key {
            style::Attribute::Bold
        } else {
            style::Attribute::Dim
        };
        queue!(
            out,
            style::SetAttribute(attribute),
            style::Print(text),
            style::SetAttribute(style::Attribute::Reset),
        )?;
    }
    Ok(())
}

/// Split an item into runs, flagging the bracketed key runs. An unclosed
/// bracket runs to the end of the item as a key.
fn split_keys(item: &str) -> Vec<(&str, bool)> {
    let mut runs = Vec::new();
    let mut rest = item;
    while !rest.is_empty() {
        let Some(open) = rest.find('[') else {
            runs.push((rest, false));
            break;
        };
        if open > 0 {
            runs.push((&rest[..open], false));
        }
        rest = &rest[open..];
        match rest.find(']') {
            Some(close) => {
                runs.push((&rest[..=close], true));
                rest = &rest[close + 1..];
            }
            None => {
                runs.push((rest, true));
                break;
            }
        }
    }
    runs
}
