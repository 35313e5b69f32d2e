//! Keyboard event handling.
//!
//! Keys are mapped to [`Action`]s depending on the focused field:
//! - `Tab` / `Down`: next field, `Shift+Tab` / `Up`: previous field
//! - `Left` / `Right`: change mode or organism, move in the amino-acid selector
//! - `h` / `l`: same as `Left` / `Right` on the mode and organism fields
//! - characters: type into text fields, toggle amino acids (`Space` toggles
//!   the amino acid under the cursor)
//! - `Backspace`: delete the last character
//! - `Enter`: submit immediately
//! - `F1`: show help; `?` also does on the mode, organism and amino-acid fields
//! - `Ctrl+C`, `Ctrl+Q` or `Esc`: quit; `q` also quits on the mode and organism
//!   fields (on the amino-acid selector it toggles Q)

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

use crate::model::{AppState, Field};

/// Actions that can be triggered by keyboard input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// No action (key not recognized)
    None,
    /// Quit the application
    Quit,
    /// Focus the next field
    FocusNext,
    /// Focus the previous field
    FocusPrevious,
    /// Left key on the focused field
    MoveLeft,
    /// Right key on the focused field
    MoveRight,
    /// Character typed into the focused field
    Input(char),
    /// Delete the last character of the focused field
    Backspace,
    /// Submit the form now
    Submit,
    /// Close the error popup
    DismissError,
    /// Show or hide the help overlay
    ToggleHelp,
    /// Dismiss the help overlay
    DismissHelp,
    /// Resize event (terminal resized)
    Resize(u16, u16),
}

/// Polls for keyboard events with a timeout.
///
/// Returns `None` if no event occurred within the timeout.
pub fn poll_event(timeout: Duration) -> Option<Event> {
    if event::poll(timeout).ok()? {
        event::read().ok()
    } else {
        None
    }
}

/// Converts a crossterm event to an Action based on the current state.
pub fn handle_event(event: Event, focus: Field, show_help: bool, has_error: bool) -> Action {
    match event {
        Event::Key(key_event) if key_event.kind != KeyEventKind::Release => {
            handle_key_event(key_event, focus, show_help, has_error)
        }
        Event::Resize(width, height) => Action::Resize(width, height),
        _ => Action::None,
    }
}

/// Handles a key event based on the focused field.
fn handle_key_event(key: KeyEvent, focus: Field, show_help: bool, has_error: bool) -> Action {
    // Emergency quit works everywhere
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
    {
        return Action::Quit;
    }

    // Overlays swallow the next key
    if show_help {
        return Action::DismissHelp;
    }
    if has_error {
        return Action::DismissError;
    }

    match key.code {
        KeyCode::Tab | KeyCode::Down => Action::FocusNext,
        KeyCode::BackTab | KeyCode::Up => Action::FocusPrevious,
        KeyCode::Left => Action::MoveLeft,
        KeyCode::Right => Action::MoveRight,
        KeyCode::Enter => Action::Submit,
        KeyCode::Backspace => Action::Backspace,
        KeyCode::Esc => Action::Quit,
        KeyCode::F(1) => Action::ToggleHelp,
        KeyCode::Char(c) => handle_char(c, focus),
        _ => Action::None,
    }
}

/// Handles a printable character.
fn handle_char(c: char, focus: Field) -> Action {
    match focus {
        Field::Mode | Field::Organism => match c {
            'h' => Action::MoveLeft,
            'l' => Action::MoveRight,
            'j' => Action::FocusNext,
            'k' => Action::FocusPrevious,
            'q' => Action::Quit,
            '?' => Action::ToggleHelp,
            _ => Action::None,
        },
        Field::AminoAcids if c == '?' => Action::ToggleHelp,
        _ => Action::Input(c),
    }
}

/// Applies an action to the application state.
///
/// Returns `true` if the application should continue, `false` if it should quit.
pub fn apply_action(state: &mut AppState, action: Action) -> bool {
    match action {
        Action::None => {}
        Action::Quit => {
            state.should_quit = true;
        }
        Action::FocusNext => {
            state.focus_next();
        }
        Action::FocusPrevious => {
            state.focus_previous();
        }
        Action::MoveLeft => {
            state.move_left();
        }
        Action::MoveRight => {
            state.move_right();
        }
        Action::Input(c) => {
            state.input_char(c);
        }
        Action::Backspace => {
            state.backspace();
        }
        Action::Submit => {
            state.submit_now();
        }
        Action::DismissError => {
            state.dismiss_error();
        }
        Action::ToggleHelp => {
            state.toggle_help();
        }
        Action::DismissHelp => {
            state.dismiss_help();
        }
        Action::Resize(_, _) => {
            // Layout is recomputed on every draw
        }
    }

    !state.should_quit
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_field_navigation() {
        assert_eq!(handle_key_event(key(KeyCode::Tab), Field::Mode, false, false), Action::FocusNext);
        assert_eq!(handle_key_event(key(KeyCode::BackTab), Field::Codon, false, false), Action::FocusPrevious);
        assert_eq!(handle_key_event(key(KeyCode::Down), Field::AaSeq, false, false), Action::FocusNext);
        assert_eq!(handle_key_event(key(KeyCode::Left), Field::Organism, false, false), Action::MoveLeft);
        assert_eq!(handle_key_event(key(KeyCode::Right), Field::AminoAcids, false, false), Action::MoveRight);
    }

    #[test]
    fn test_vim_keys_on_selectors() {
        assert_eq!(handle_key_event(key(KeyCode::Char('h')), Field::Mode, false, false), Action::MoveLeft);
        assert_eq!(handle_key_event(key(KeyCode::Char('l')), Field::Organism, false, false), Action::MoveRight);
        assert_eq!(handle_key_event(key(KeyCode::Char('q')), Field::Mode, false, false), Action::Quit);
    }

    #[test]
    fn test_text_fields_take_characters() {
        assert_eq!(handle_key_event(key(KeyCode::Char('q')), Field::AaSeq, false, false), Action::Input('q'));
        assert_eq!(handle_key_event(key(KeyCode::Char('h')), Field::Edits, false, false), Action::Input('h'));
        assert_eq!(handle_key_event(key(KeyCode::Char(' ')), Field::AminoAcids, false, false), Action::Input(' '));
        assert_eq!(handle_key_event(key(KeyCode::Backspace), Field::Codon, false, false), Action::Backspace);
    }

    #[test]
    fn test_submit_and_quit() {
        assert_eq!(handle_key_event(key(KeyCode::Enter), Field::Codon, false, false), Action::Submit);
        assert_eq!(handle_key_event(key(KeyCode::Esc), Field::Codon, false, false), Action::Quit);

        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key_event(ctrl_c, Field::AaSeq, true, true), Action::Quit);
    }

    #[test]
    fn test_overlays_swallow_keys() {
        assert_eq!(handle_key_event(key(KeyCode::Char('x')), Field::AaSeq, true, false), Action::DismissHelp);
        assert_eq!(handle_key_event(key(KeyCode::Enter), Field::AaSeq, false, true), Action::DismissError);
        assert_eq!(handle_key_event(key(KeyCode::F(1)), Field::AaSeq, false, false), Action::ToggleHelp);
    }

    #[test]
    fn test_help_and_quit_keys_per_field() {
        let q = key(KeyCode::Char('q'));
        let help = key(KeyCode::Char('?'));
        assert_eq!(handle_key_event(q, Field::Organism, false, false), Action::Quit);
        assert_eq!(handle_key_event(q, Field::AminoAcids, false, false), Action::Input('q'));
        assert_eq!(handle_key_event(help, Field::Mode, false, false), Action::ToggleHelp);
        assert_eq!(handle_key_event(help, Field::AminoAcids, false, false), Action::ToggleHelp);
        assert_eq!(handle_key_event(help, Field::Edits, false, false), Action::Input('?'));
    }

    #[test]
    fn test_resize_event() {
        assert_eq!(handle_event(Event::Resize(80, 24), Field::Mode, false, false), Action::Resize(80, 24));
    }
}
