use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};

use crate::app::App;

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // Ignore key releases on terminals that report them
    if key.kind == KeyEventKind::Release {
        return;
    }

    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    // Reset prompt swallows everything but its answer
    if app.confirm_reset {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm_reset(),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_reset(),
            _ => {}
        }
        return;
    }

    match key.code {
        // Quit
        KeyCode::Char('q') => app.quit(),

        // Session controls
        KeyCode::Char(' ') => app.toggle_measuring(),
        KeyCode::Char('m') => app.mark_event(),
        KeyCode::Char('r') => app.request_reset(),
        KeyCode::Char('a') => app.toggle_alarm(),

        // Help
        KeyCode::Char('?') => app.toggle_help(),

        // Export
        KeyCode::Char('e') => match app.export_report() {
            Ok(path) => {
                app.set_status_message(format!("Exported to {}", path.display()));
            }
            Err(e) => {
                app.set_status_message(format!("Export failed: {}", e));
            }
        },

        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{
        AlarmConfig, ManualTime, Phase, SessionController, SharedSession, DEFAULT_REFRESH,
    };
    use crate::source::ChannelSource;
    use crate::ui::Theme;
    use crossterm::event::KeyModifiers;

    fn app() -> App {
        let controller =
            SessionController::new(Box::new(ManualTime::new()), AlarmConfig::default());
        let (session, rx) = SharedSession::with_notifications(controller, DEFAULT_REFRESH);
        let (_handle, source) = ChannelSource::create("test");
        App::new(session, rx, Box::new(source), Theme::dark())
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn test_space_toggles_phase() {
        let mut app = app();
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.state().phase, Phase::Running);
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.state().phase, Phase::Paused);
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.state().phase, Phase::Running);
    }

    #[test]
    fn test_reset_requires_confirmation() {
        let mut app = app();
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Char('r'));
        assert!(app.confirm_reset);
        // Unrelated keys are swallowed by the prompt
        press(&mut app, KeyCode::Char('q'));
        assert!(app.running);
        assert_eq!(app.state().phase, Phase::Running);

        press(&mut app, KeyCode::Char('n'));
        assert!(!app.confirm_reset);
        assert_eq!(app.state().phase, Phase::Running);

        press(&mut app, KeyCode::Char('r'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.state().phase, Phase::Idle);
    }

    #[test]
    fn test_help_closes_on_any_key() {
        let mut app = app();
        press(&mut app, KeyCode::Char('?'));
        assert!(app.show_help);
        press(&mut app, KeyCode::Char(' '));
        assert!(!app.show_help);
        assert_eq!(app.state().phase, Phase::Idle);
    }

    #[test]
    fn test_quit() {
        let mut app = app();
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.running);
    }
}
