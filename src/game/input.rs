#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKey {
    Forward,
    Backward,
    TurnLeft,
    TurnRight,
}

impl ControlKey {
    /// Maps a DOM `KeyboardEvent.key` value. Case-insensitive.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "w" | "W" => Some(ControlKey::Forward),
            "s" | "S" => Some(ControlKey::Backward),
            "a" | "A" => Some(ControlKey::TurnLeft),
            "d" | "D" => Some(ControlKey::TurnRight),
            _ => None,
        }
    }
}

/// Which control keys are held right now. Only the key handlers write it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub turn_left: bool,
    pub turn_right: bool,
}

impl InputState {
    pub fn set_flag(&mut self, key: ControlKey, pressed: bool) {
        match key {
            ControlKey::Forward => self.forward = pressed,
            ControlKey::Backward => self.backward = pressed,
            ControlKey::TurnLeft => self.turn_left = pressed,
            ControlKey::TurnRight => self.turn_right = pressed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wasd_in_either_case() {
        assert_eq!(ControlKey::from_key("w"), Some(ControlKey::Forward));
        assert_eq!(ControlKey::from_key("S"), Some(ControlKey::Backward));
        assert_eq!(ControlKey::from_key("a"), Some(ControlKey::TurnLeft));
        assert_eq!(ControlKey::from_key("D"), Some(ControlKey::TurnRight));
        assert_eq!(ControlKey::from_key("ArrowUp"), None);
        assert_eq!(ControlKey::from_key(" "), None);
    }

    #[test]
    fn flags_are_independent() {
        let mut input = InputState::default();
        input.set_flag(ControlKey::Forward, true);
        input.set_flag(ControlKey::Backward, true);
        input.set_flag(ControlKey::TurnLeft, true);
        assert!(input.forward);
        assert!(input.backward);
        assert!(!input.turn_right);

        input.set_flag(ControlKey::Forward, false);
        assert!(!input.forward);
        assert!(input.backward && input.turn_left);
    }
}
