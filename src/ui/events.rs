use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Keys the screens understand. Everything else is dropped at the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Back,
    Backspace,
    Refresh,
    Quit,
    Char(char),
}

pub fn map_key(key: KeyEvent) -> Option<Key> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match (key.code, key.modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Key::Quit),
        (KeyCode::Char('q'), KeyModifiers::NONE) => Some(Key::Quit),
        (KeyCode::Char('r'), KeyModifiers::NONE) => Some(Key::Refresh),

        (KeyCode::Up, _) => Some(Key::Up),
        (KeyCode::Down, _) => Some(Key::Down),
        (KeyCode::Left, _) => Some(Key::Left),
        (KeyCode::Right, _) => Some(Key::Right),
        (KeyCode::Enter, _) => Some(Key::Enter),
        (KeyCode::Esc, _) => Some(Key::Back),
        (KeyCode::Backspace, _) => Some(Key::Backspace),

        (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) if !c.is_control() => {
            Some(Key::Char(c))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn maps_navigation_and_commands() {
        assert_eq!(map_key(press(KeyCode::Enter, KeyModifiers::NONE)), Some(Key::Enter));
        assert_eq!(map_key(press(KeyCode::Left, KeyModifiers::NONE)), Some(Key::Left));
        assert_eq!(map_key(press(KeyCode::Char('r'), KeyModifiers::NONE)), Some(Key::Refresh));
        assert_eq!(map_key(press(KeyCode::Char('q'), KeyModifiers::NONE)), Some(Key::Quit));
        assert_eq!(map_key(press(KeyCode::Char('c'), KeyModifiers::CONTROL)), Some(Key::Quit));
        assert_eq!(map_key(press(KeyCode::Char('7'), KeyModifiers::NONE)), Some(Key::Char('7')));
    }

    #[test]
    fn ignores_releases_and_unbound_keys() {
        let mut release = press(KeyCode::Enter, KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert_eq!(map_key(release), None);
        assert_eq!(map_key(press(KeyCode::F(5), KeyModifiers::NONE)), None);
    }
}
