//! Salvages meal objects from truncated or otherwise malformed JSON.
//!
//! [`ObjectScanner`] is a small lexer over the raw text: it tracks whether it
//! is inside a string literal and keeps a stack of the byte offsets of open
//! braces. Whenever the stack empties, a complete top-level `{...}` has been
//! seen and its slice is yielded. A `]` at depth zero closes the `meals`
//! array and ends the scan.

use serde_json::Value;

use super::coerce::coerce_meal;
use crate::data_types::Meal;

/// A plan has at most breakfast, lunch and dinner.
pub const MAX_RECOVERED_MEALS: usize = 3;

const MEALS_KEY: &str = "\"meals\"";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Structural,
    InString,
    Escape,
}

#[derive(Debug)]
pub struct ObjectScanner<'a> {
    text: &'a str,
    pos: usize,
    open_braces: Vec<usize>,
    state: LexState,
    done: bool,
}

impl<'a> ObjectScanner<'a> {
    /// Scans `text` from byte offset `start`, which must be a char boundary.
    pub fn new(text: &'a str, start: usize) -> Self {
        Self {
            text,
            pos: start.min(text.len()),
            open_braces: Vec::new(),
            state: LexState::Structural,
            done: false,
        }
    }

    /// Positions the scanner just inside the array that follows the first
    /// `"meals"` key. `None` when there is no such key or no `[` after it.
    pub fn for_meals_array(text: &'a str) -> Option<Self> {
        let key = text.find(MEALS_KEY)?;
        let after_key = key + MEALS_KEY.len();
        let open = after_key + text[after_key..].find('[')?;
        Some(Self::new(text, open + 1))
    }

    pub fn depth(&self) -> usize {
        self.open_braces.len()
    }
}

impl<'a> Iterator for ObjectScanner<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.done {
            return None;
        }
        let bytes = self.text.as_bytes();
        while self.pos < bytes.len() {
            let i = self.pos;
            let b = bytes[i];
            self.pos += 1;

            match self.state {
                LexState::Escape => self.state = LexState::InString,
                LexState::InString => match b {
                    b'\\' => self.state = LexState::Escape,
                    b'"' => self.state = LexState::Structural,
                    _ => {}
                },
                LexState::Structural => match b {
                    b'"' => self.state = LexState::InString,
                    b'{' => self.open_braces.push(i),
                    b'}' => {
                        // A stray closing brace at depth zero is ignored.
                        if let Some(start) = self.open_braces.pop() {
                            if self.open_braces.is_empty() {
                                return Some(&self.text[start..=i]);
                            }
                        }
                    }
                    b']' if self.open_braces.is_empty() => {
                        self.done = true;
                        return None;
                    }
                    _ => {}
                },
            }
        }
        self.done = true;
        None
    }
}

/// Parses each complete object after the `meals` key on its own and coerces
/// it. Objects that fail to parse are skipped. Stops after
/// [`MAX_RECOVERED_MEALS`] meals.
pub fn recover_meals(text: &str) -> Vec<Meal> {
    let Some(scanner) = ObjectScanner::for_meals_array(text) else {
        log::debug!("No \"meals\" array found in AI response");
        return Vec::new();
    };

    let mut meals = Vec::new();
    for fragment in scanner {
        match serde_json::from_str::<Value>(fragment) {
            Ok(value) => meals.push(coerce_meal(&value, meals.len())),
            Err(e) => log::debug!("Skipping unparsable meal object ({}): {}", e, fragment),
        }
        if meals.len() >= MAX_RECOVERED_MEALS {
            break;
        }
    }
    meals
}
