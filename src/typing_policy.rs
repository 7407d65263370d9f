use crate::passage::Passage;

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
}

/// What a single keystroke did to the current leg.
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum KeyEffect {
    Typed(Outcome),
    Erased(Outcome),
    Ignored,
}

/// Character counters accumulated over the whole session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub correct_chars: usize,
    pub total_chars: usize,
}

/// Input typed against the passage currently on screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Leg {
    pub input: Vec<char>,
    /// Correct characters in this leg, drives progress highlighting.
    pub progress: usize,
}

impl Leg {
    /// The leg is over once the input is as long as the passage, mistakes included.
    pub fn is_complete(&self, passage: &Passage) -> bool {
        self.input.len() >= passage.len()
    }

    pub fn reset(&mut self) {
        self.input.clear();
        self.progress = 0;
    }

    pub fn input_string(&self) -> String {
        self.input.iter().collect()
    }
}

fn expected_matches(passage: &Passage, idx: usize, c: char) -> bool {
    passage.char_at(idx) == Some(c)
}

/// Apply a printable character.
///
/// A space typed right after another space is dropped without being counted.
pub fn apply_char(leg: &mut Leg, tally: &mut Tally, passage: &Passage, c: char) -> KeyEffect {
    if c == ' ' && leg.input.last() == Some(&' ') {
        return KeyEffect::Ignored;
    }

    leg.input.push(c);
    tally.total_chars += 1;

    if expected_matches(passage, leg.input.len() - 1, c) {
        tally.correct_chars += 1;
        leg.progress += 1;
        KeyEffect::Typed(Outcome::Correct)
    } else {
        KeyEffect::Typed(Outcome::Incorrect)
    }
}

/// Undo the last character of the leg, reversing whatever it counted.
pub fn apply_backspace(leg: &mut Leg, tally: &mut Tally, passage: &Passage) -> KeyEffect {
    let Some(&last) = leg.input.last() else {
        return KeyEffect::Ignored;
    };

    let outcome = if expected_matches(passage, leg.input.len() - 1, last) {
        tally.correct_chars = tally.correct_chars.saturating_sub(1);
        leg.progress = leg.progress.saturating_sub(1);
        Outcome::Correct
    } else {
        Outcome::Incorrect
    };

    leg.input.pop();
    tally.total_chars = tally.total_chars.saturating_sub(1);
    KeyEffect::Erased(outcome)
}
