//! Character-level phoneme classification and per-syllable profiles.

use serde::{Deserialize, Serialize};

const FRONT_VOWELS: &str = "yüöøäæ";
const NEUTRAL_VOWELS: &str = "èéêëeiíï";
const BACK_VOWELS: &str = "ɑaoòóõuú";

const CLOSE_VOWELS: &str = "iíïyüuú";
const MID_VOWELS: &str = "èéêëeöøoòóõ";
const OPEN_VOWELS: &str = "äæɑa";

const SOFT_CONSONANTS: &str = "mnlrjvʋŋɱ";
const HARD_CONSONANTS: &str = "ptkbdgsfhʃçɦx";

const LONG_VOWEL_MARKERS: [char; 2] = ['ː', 'ˑ'];
const SILENT_MARKERS: [char; 5] = ['ˈ', 'ˌ', '\'', '-', '+'];

/// Syllable boundary markers in a transcription.
const SYLLABLE_MARKERS: [char; 2] = ['-', '+'];

/// Softness reported for a syllable without consonants.
pub const BALANCED_SOFTNESS: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frontness {
    Front,
    Neutral,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Openness {
    Close,
    Mid,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Softness {
    Soft,
    Hard,
}

pub fn frontness(c: char) -> Option<Frontness> {
    if FRONT_VOWELS.contains(c) {
        Some(Frontness::Front)
    } else if NEUTRAL_VOWELS.contains(c) {
        Some(Frontness::Neutral)
    } else if BACK_VOWELS.contains(c) {
        Some(Frontness::Back)
    } else {
        None
    }
}

pub fn openness(c: char) -> Option<Openness> {
    if CLOSE_VOWELS.contains(c) {
        Some(Openness::Close)
    } else if MID_VOWELS.contains(c) {
        Some(Openness::Mid)
    } else if OPEN_VOWELS.contains(c) {
        Some(Openness::Open)
    } else {
        None
    }
}

pub fn softness(c: char) -> Option<Softness> {
    if SOFT_CONSONANTS.contains(c) {
        Some(Softness::Soft)
    } else if HARD_CONSONANTS.contains(c) {
        Some(Softness::Hard)
    } else {
        None
    }
}

/// Sound-symbolic valence: negative is warm and round, positive sharp.
pub fn valence(c: char) -> Option<f64> {
    let v = match c {
        'u' => -1.0,
        'o' => -0.9,
        'm' => -0.8,
        'ö' => -0.75,
        'a' => -0.7,
        'ä' => -0.6,
        'n' => -0.5,
        'e' => -0.35,
        'j' => -0.3,
        'v' => -0.2,
        'h' => -0.1,
        'k' => 1.0,
        't' => 0.9,
        's' => 0.8,
        'f' => 0.7,
        'p' => 0.6,
        'g' => 0.5,
        'd' => 0.4,
        'i' => 0.35,
        'b' => 0.3,
        'r' => 0.2,
        'y' => 0.15,
        _ => return None,
    };
    Some(v)
}

pub fn is_vowel(c: char) -> bool {
    frontness(c).is_some()
}

/// Split a transcription on runs of syllable markers.
pub fn split_syllables(transcription: &str) -> Vec<&str> {
    transcription
        .split(|c: char| SYLLABLE_MARKERS.contains(&c))
        .filter(|s| !s.is_empty())
        .collect()
}

fn ratio(count: usize, total: usize, fallback: f64) -> f64 {
    if total == 0 {
        fallback
    } else {
        count as f64 / total as f64
    }
}

/// Feature ratios of a stretch of phonemes.
///
/// Each axis only counts the characters it classifies; an axis with no
/// observed characters reports 0, except softness which reports 0.5.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhonemeProfile {
    pub front_ratio: f64,
    pub neutral_ratio: f64,
    pub back_ratio: f64,
    pub close_ratio: f64,
    pub mid_ratio: f64,
    pub open_ratio: f64,
    pub soft_ratio: f64,
    pub valence: f64,
}

impl Default for PhonemeProfile {
    fn default() -> Self {
        Self {
            front_ratio: 0.0,
            neutral_ratio: 0.0,
            back_ratio: 0.0,
            close_ratio: 0.0,
            mid_ratio: 0.0,
            open_ratio: 0.0,
            soft_ratio: BALANCED_SOFTNESS,
            valence: 0.0,
        }
    }
}

impl PhonemeProfile {
    pub fn of(text: &str) -> Self {
        let text = text.trim().to_lowercase();
        if text.is_empty() {
            return Self::default();
        }

        let (mut front, mut neutral, mut back) = (0, 0, 0);
        let (mut close, mut mid, mut open) = (0, 0, 0);
        let (mut soft, mut hard) = (0, 0);
        let (mut valence_sum, mut valence_count) = (0.0, 0);

        for c in text.chars() {
            match frontness(c) {
                Some(Frontness::Front) => front += 1,
                Some(Frontness::Neutral) => neutral += 1,
                Some(Frontness::Back) => back += 1,
                None => {}
            }
            match openness(c) {
                Some(Openness::Close) => close += 1,
                Some(Openness::Mid) => mid += 1,
                Some(Openness::Open) => open += 1,
                None => {}
            }
            match softness(c) {
                Some(Softness::Soft) => soft += 1,
                Some(Softness::Hard) => hard += 1,
                None => {}
            }
            if let Some(v) = valence(c) {
                valence_sum += v;
                valence_count += 1;
            }
        }

        let vowels = front + neutral + back;
        let graded = close + mid + open;
        let consonants = soft + hard;

        Self {
            front_ratio: ratio(front, vowels, 0.0),
            neutral_ratio: ratio(neutral, vowels, 0.0),
            back_ratio: ratio(back, vowels, 0.0),
            close_ratio: ratio(close, graded, 0.0),
            mid_ratio: ratio(mid, graded, 0.0),
            open_ratio: ratio(open, graded, 0.0),
            soft_ratio: ratio(soft, consonants, BALANCED_SOFTNESS),
            valence: if valence_count == 0 {
                0.0
            } else {
                valence_sum / valence_count as f64
            },
        }
    }
}

/// Whether a syllable counts as heavy.
///
/// Heavy: a long-vowel marker, two or more vowels, or any consonant after
/// the last vowel (a closed syllable).
pub fn syllable_is_heavy(syllable: &str) -> bool {
    let chars: Vec<char> = syllable.to_lowercase().chars().collect();
    if chars.is_empty() {
        return false;
    }
    if chars.iter().any(|c| LONG_VOWEL_MARKERS.contains(c)) {
        return true;
    }

    let vowel_positions: Vec<usize> = chars
        .iter()
        .enumerate()
        .filter(|(_, c)| is_vowel(**c))
        .map(|(i, _)| i)
        .collect();
    let Some(&last_vowel) = vowel_positions.last() else {
        return false;
    };
    if vowel_positions.len() >= 2 {
        return true;
    }

    chars[last_vowel + 1..]
        .iter()
        .any(|&c| !LONG_VOWEL_MARKERS.contains(&c) && !SILENT_MARKERS.contains(&c) && !is_vowel(c))
}

/// `H`/`L` per syllable.
pub fn weight_sequence(transcription: &str) -> String {
    split_syllables(transcription)
        .into_iter()
        .map(|s| if syllable_is_heavy(s) { 'H' } else { 'L' })
        .collect()
}

/// Map a stored weight sequence onto the display alphabet (`R` heavy,
/// `K` light). Anything unrecognised counts as light.
pub fn rhythm_code(sequence: &str) -> String {
    if sequence.eq_ignore_ascii_case("nan") {
        return String::new();
    }
    sequence
        .chars()
        .map(|c| match c.to_ascii_uppercase() {
            'H' | 'R' => 'R',
            _ => 'K',
        })
        .collect()
}

/// Collapse IPA-ish variants onto the plain alphabet.
pub fn simplify_phoneme(c: char) -> Option<char> {
    let c = c.to_lowercase().next()?;
    let mapped = match c {
        'æ' => 'ä',
        'ø' => 'ö',
        'å' | 'ò' | 'ó' | 'ô' | 'õ' => 'o',
        'ɑ' => 'a',
        'ü' => 'y',
        'ï' | 'í' => 'i',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ù' | 'ú' => 'u',
        'ʋ' | 'w' => 'v',
        'ŋ' => 'n',
        'ɱ' => 'm',
        'ʃ' => 's',
        'ç' | 'ķ' => 'k',
        'ɦ' => 'h',
        other => other,
    };
    (mapped.is_ascii_lowercase() || matches!(mapped, 'å' | 'ä' | 'ö')).then_some(mapped)
}

/// First simplified phoneme of a phonemic string, skipping stress and
/// boundary markers.
pub fn simplified_initial(text: &str) -> Option<char> {
    text.chars()
        .filter(|c| !c.is_whitespace() && !SILENT_MARKERS.contains(c))
        .find_map(simplify_phoneme)
}
