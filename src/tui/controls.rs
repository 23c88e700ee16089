//! Keyboard input handling for the dashboard.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::runtime::{App, Tab};

/// Maps a key event to an application action.
///
/// Guards on [`KeyEventKind::Press`] to avoid double-fire on some terminals.
/// While the settings tab is open, printable keys edit the focused field.
pub fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    app.notice = None;
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit = true;
        return;
    }
    if app.tab == Tab::Settings {
        handle_settings_key(app, key);
        return;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Char('o') => app.toggle_optimization(),
        KeyCode::Char('r') => app.refresh(),
        KeyCode::Char('b') => app.next_building(),
        KeyCode::Char('1') => app.set_tab(Tab::Consumption),
        KeyCode::Char('2') => app.set_tab(Tab::Predictions),
        KeyCode::Char('3' | 's') => app.set_tab(Tab::Settings),
        _ => {}
    }
}

fn handle_settings_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.set_tab(Tab::Consumption),
        KeyCode::Enter => app.submit_settings(),
        KeyCode::Tab | KeyCode::Down => app.settings.focus_next(),
        KeyCode::BackTab | KeyCode::Up => app.settings.focus_prev(),
        KeyCode::Backspace => app.settings.backspace(),
        KeyCode::Char(c) => app.settings.input(c),
        _ => {}
    }
}
