use crate::app::App;
use crate::input::InputAction;

pub fn dispatch(app: &mut App, action: InputAction) {
    match action {
        InputAction::None => {}
        InputAction::Quit => app.should_quit = true,
        InputAction::MoveLeft => app.move_cursor(-1, 0),
        InputAction::MoveRight => app.move_cursor(1, 0),
        InputAction::MoveUp => app.move_cursor(0, -1),
        InputAction::MoveDown => app.move_cursor(0, 1),
        InputAction::Activate => app.activate(),
    }
}
