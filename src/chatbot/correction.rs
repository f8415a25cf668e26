//! Typo interception before classification.
//!
//! Fuzzy-matches each word of the user's (lowercased) input against a small
//! vocabulary of CRC terms and question words. Only corrects when confidence
//! is high: the word is unknown, at least 4 characters long, within edit
//! distance 1 (short words) or 2 (longer words), and has a unique best match.
//! Anything else fails closed and returns `None`.

use serde::{Deserialize, Serialize};

/// Words the corrector may suggest. Sorted for binary search.
const CORRECTION_TARGETS: &[&str] = &[
    "abdominal", "about", "adenoma", "anemia", "biopsy", "bleeding", "blood",
    "bowel", "cancer", "chemotherapy", "colon", "colonoscopy", "colorectal",
    "constipation", "could", "diarrhea", "diet", "doctor", "does", "exercise",
    "family", "fatigue", "fiber", "gastroenterologist", "genetic", "have",
    "hemorrhoids", "hereditary", "history", "lynch", "polyp", "polyps",
    "prevention", "radiation", "rectal", "rectum", "risk", "screen",
    "screening", "should", "sigmoidoscopy", "stool", "surgery", "symptom",
    "symptoms", "treatment", "tumor", "what", "when", "where", "which",
    "would",
];

/// Ordinary words that sit close to a target and must never be "corrected".
/// Sorted for binary search.
const COMMON_WORDS: &[&str] = &[
    "after", "again", "also", "anything", "been", "before", "bloody", "bloom",
    "breeding", "brood", "cancel", "cold", "color", "colour", "dancer", "days",
    "died", "dies", "else", "familiar", "feeding", "feel", "feeling", "first",
    "flood", "from", "good", "hello", "help", "here", "into", "just", "know",
    "last", "leading", "like", "long", "make", "many", "more", "most", "much",
    "mystery", "need", "normal", "often", "only", "other", "over", "pain",
    "please", "reading", "rental", "right", "school", "screaming", "some",
    "start", "still", "stood", "stop", "sure", "take", "tell", "test", "than",
    "thank", "thanks", "that", "their", "them", "then", "there", "these",
    "they", "think", "this", "those", "time", "tired", "tool", "towel",
    "tumour", "under", "very", "want", "week", "weeks", "well", "went", "were",
    "while", "will", "with", "year", "years", "your",
];

const INFLECTIONS: &[&str] = &["ing", "es", "ed", "ly", "s"];

/// A likely misspelling and the text it should have been.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    pub original: String,
    pub corrected: String,
    pub replacements: Vec<Replacement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    pub from: String,
    pub to: String,
}

/// Look for correctable words in already-lowercased input.
pub fn find_correction(lowered: &str) -> Option<Correction> {
    let mut corrected = String::with_capacity(lowered.len());
    let mut replacements = Vec::new();
    let mut word_buf = String::new();

    for ch in lowered.chars() {
        if ch.is_alphanumeric() {
            word_buf.push(ch);
        } else {
            flush_word(&mut word_buf, &mut corrected, &mut replacements);
            corrected.push(ch);
        }
    }
    flush_word(&mut word_buf, &mut corrected, &mut replacements);

    if replacements.is_empty() {
        return None;
    }

    Some(Correction {
        original: lowered.to_string(),
        corrected,
        replacements,
    })
}

/// The confirmation question shown to the user.
pub fn correction_message(correction: &Correction) -> String {
    format!(
        "Did you mean: \"{}\"? Reply \"yes\" if that's right, or rephrase your question.",
        correction.corrected
    )
}

fn flush_word(word: &mut String, out: &mut String, replacements: &mut Vec<Replacement>) {
    if word.is_empty() {
        return;
    }
    match suggest(word) {
        Some(term) => {
            replacements.push(Replacement {
                from: word.clone(),
                to: term.to_string(),
            });
            out.push_str(term);
        }
        None => out.push_str(word),
    }
    word.clear();
}

/// Best unambiguous target for one word, if the word needs correcting.
fn suggest(word: &str) -> Option<&'static str> {
    let len = word.chars().count();
    if len < 4 || word.chars().any(|c| c.is_ascii_digit()) || is_known(word) {
        return None;
    }

    let max_distance = if len <= 5 { 1 } else { 2 };
    let mut best: Option<&'static str> = None;
    let mut best_distance = max_distance + 1;
    let mut ambiguous = false;

    for &term in CORRECTION_TARGETS {
        let len_diff = (len as i64 - term.chars().count() as i64).unsigned_abs() as u32;
        if len_diff > max_distance {
            continue;
        }

        let dist = edit_distance(word, term);
        if dist < best_distance {
            best_distance = dist;
            best = Some(term);
            ambiguous = false;
        } else if dist == best_distance && best.is_some() {
            ambiguous = true;
        }
    }

    if ambiguous {
        None
    } else {
        best
    }
}

fn is_known(word: &str) -> bool {
    let exact = |w: &str| {
        CORRECTION_TARGETS.binary_search(&w).is_ok() || COMMON_WORDS.binary_search(&w).is_ok()
    };
    if exact(word) {
        return true;
    }
    INFLECTIONS.iter().any(|suffix| {
        word.strip_suffix(suffix)
            .is_some_and(|stem| stem.len() >= 3 && exact(stem))
    })
}

/// Optimal string alignment distance: Levenshtein plus adjacent
/// transpositions ("whta" -> "what" is 1).
fn edit_distance(a: &str, b: &str) -> u32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (m, n) = (a.len(), b.len());

    if m == 0 { return n as u32; }
    if n == 0 { return m as u32; }

    let mut d = vec![vec![0u32; n + 1]; m + 1];
    for (i, row) in d.iter_mut().enumerate() {
        row[0] = i as u32;
    }
    for j in 0..=n {
        d[0][j] = j as u32;
    }

    for i in 1..=m {
        for j in 1..=n {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            let mut best = (d[i - 1][j] + 1)
                .min(d[i][j - 1] + 1)
                .min(d[i - 1][j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                best = best.min(d[i - 2][j - 2] + 1);
            }
            d[i][j] = best;
        }
    }

    d[m][n]
}
