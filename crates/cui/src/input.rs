use crossterm::event::{KeyCode, KeyEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    None,
    Quit,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    Activate,
}

pub fn map_key(key: KeyEvent) -> InputAction {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => InputAction::Quit,
        KeyCode::Left | KeyCode::Char('h') => InputAction::MoveLeft,
        KeyCode::Right | KeyCode::Char('l') => InputAction::MoveRight,
        KeyCode::Up | KeyCode::Char('k') => InputAction::MoveUp,
        KeyCode::Down | KeyCode::Char('j') => InputAction::MoveDown,
        KeyCode::Enter | KeyCode::Char(' ') => InputAction::Activate,
        _ => InputAction::None,
    }
}
