use crate::debug_log;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const WORD_LENGTH: usize = 5;

/// Opening probe sent before any feedback is known.
pub const INITIAL_GUESS: &str = "slate";

/// Per-letter verdict from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Mark {
    Absent,
    Present,
    Correct,
}

pub type Feedback = [Mark; WORD_LENGTH];

impl Mark {
    pub fn to_char(self) -> char {
        match self {
            Self::Absent => 'X',
            Self::Present => 'Y',
            Self::Correct => 'G',
        }
    }
}

impl TryFrom<u8> for Mark {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Absent),
            1 => Ok(Self::Present),
            2 => Ok(Self::Correct),
            other => Err(format!("invalid mark {other}, expected 0, 1 or 2")),
        }
    }
}

impl From<Mark> for u8 {
    fn from(mark: Mark) -> Self {
        match mark {
            Mark::Absent => 0,
            Mark::Present => 1,
            Mark::Correct => 2,
        }
    }
}

pub fn is_solved(marks: &Feedback) -> bool {
    marks.iter().all(|m| *m == Mark::Correct)
}

pub fn format_marks(marks: &Feedback) -> String {
    marks.iter().map(|m| m.to_char()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    Exactly(u8),
    NoneOf(Vec<u8>),
}

impl Slot {
    fn accepts(&self, letter: u8) -> bool {
        match self {
            Self::Exactly(expected) => letter == *expected,
            Self::NoneOf(excluded) => !excluded.contains(&letter),
        }
    }
}

/// Everything one guess and its marks say about the solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraints {
    slots: Vec<Slot>,
    /// (letter, minimum count), in order of first `Present` mark.
    minimums: Vec<(u8, usize)>,
}

fn push_unique(letters: &mut Vec<u8>, letter: u8) {
    if !letters.contains(&letter) {
        letters.push(letter);
    }
}

impl Constraints {
    pub fn compile(guess: &str, marks: &Feedback) -> Self {
        let letters = guess.as_bytes();
        debug_assert_eq!(letters.len(), WORD_LENGTH, "guess must be {WORD_LENGTH} letters");

        let mut present: [Option<u8>; WORD_LENGTH] = [None; WORD_LENGTH];
        for (i, (&letter, mark)) in letters.iter().zip(marks).enumerate() {
            if *mark == Mark::Present {
                present[i] = Some(letter);
            }
        }
        let is_present_somewhere = |letter: u8| present.contains(&Some(letter));

        // Known-present letter first, then exclusions in the order they were seen.
        let mut excluded: Vec<Vec<u8>> = present
            .iter()
            .map(|p| p.map(|letter| vec![letter]).unwrap_or_default())
            .collect();
        for (i, (&letter, mark)) in letters.iter().zip(marks).enumerate() {
            if *mark != Mark::Absent {
                continue;
            }
            if is_present_somewhere(letter) {
                push_unique(&mut excluded[i], letter);
            } else {
                for set in &mut excluded {
                    push_unique(set, letter);
                }
            }
        }

        let slots = letters
            .iter()
            .zip(marks)
            .zip(excluded)
            .map(|((&letter, mark), excluded)| match mark {
                Mark::Correct => Slot::Exactly(letter),
                Mark::Present | Mark::Absent => Slot::NoneOf(excluded),
            })
            .collect();

        let mut minimums: Vec<(u8, usize)> = Vec::new();
        for letter in present.iter().flatten() {
            match minimums.iter_mut().find(|(l, _)| l == letter) {
                Some((_, count)) => *count += 1,
                None => minimums.push((*letter, 1)),
            }
        }

        Self { slots, minimums }
    }

    pub fn matches(&self, word: &str) -> bool {
        let letters = word.as_bytes();
        if letters.len() != self.slots.len() {
            return false;
        }
        if !self.slots.iter().zip(letters).all(|(slot, &l)| slot.accepts(l)) {
            return false;
        }
        self.minimums
            .iter()
            .all(|&(letter, min)| letters.iter().filter(|&&l| l == letter).count() >= min)
    }
}

/// Renders the equivalent regular expression, e.g. `^(?=.*i)qu[^ite][^te][^te]$`.
impl fmt::Display for Constraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("^")?;
        for &(letter, min) in &self.minimums {
            f.write_str("(?=")?;
            for _ in 0..min {
                write!(f, ".*{}", letter as char)?;
            }
            f.write_str(")")?;
        }
        for slot in &self.slots {
            match slot {
                Slot::Exactly(letter) => write!(f, "{}", *letter as char)?,
                Slot::NoneOf(excluded) => {
                    f.write_str("[^")?;
                    for &letter in excluded {
                        write!(f, "{}", letter as char)?;
                    }
                    f.write_str("]")?;
                }
            }
        }
        f.write_str("$")
    }
}

pub fn filter_candidates(candidates: &[String], guess: &str, marks: &Feedback) -> Vec<String> {
    let constraints = Constraints::compile(guess, marks);
    debug_log!("filter for {guess} {}: {constraints}", format_marks(marks));
    candidates
        .iter()
        .filter(|word| constraints.matches(word))
        .cloned()
        .collect()
}

/// Narrows `candidates` by one round of feedback and picks the first survivor.
///
/// Returns `(None, [])` when no candidate is consistent with the marks.
pub fn find_next_guess(
    guess: &str,
    marks: &Feedback,
    candidates: &[String],
) -> (Option<String>, Vec<String>) {
    let filtered = filter_candidates(candidates, guess, marks);
    debug_log!("{} of {} candidates remain", filtered.len(), candidates.len());
    (filtered.first().cloned(), filtered)
}

/// Server-side grading rules, used to check the filter against real feedback.
#[cfg(test)]
pub(crate) fn grade(guess: &str, solution: &str) -> Feedback {
    let guess = guess.as_bytes();
    let mut remaining: Vec<Option<u8>> = solution.bytes().map(Some).collect();
    let mut marks = [Mark::Absent; WORD_LENGTH];
    for i in 0..WORD_LENGTH {
        if Some(guess[i]) == remaining[i] {
            marks[i] = Mark::Correct;
            remaining[i] = None;
        }
    }
    for i in 0..WORD_LENGTH {
        if marks[i] == Mark::Correct {
            continue;
        }
        if let Some(pos) = remaining.iter().position(|&c| c == Some(guess[i])) {
            marks[i] = Mark::Present;
            remaining[pos] = None;
        }
    }
    marks
}
