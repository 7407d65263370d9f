/// Standard "word" length used for WPM.
pub const CHARS_PER_WORD: usize = 5;

/// Words per minute from correctly typed characters.
///
/// Whole words only (`correct_chars / 5` rounds down), and the result is truncated.
/// A non-positive elapsed time falls back to a one minute divisor so the estimate
/// stays finite right after the session starts.
pub fn wpm(correct_chars: usize, elapsed_secs: f64) -> u32 {
    let words = (correct_chars / CHARS_PER_WORD) as f64;
    let minutes = elapsed_secs / 60.0;
    let divisor = if minutes > 0.0 { minutes } else { 1.0 };

    (words / divisor) as u32
}

/// Percentage of typed characters that matched the expected character.
pub fn accuracy(correct_chars: usize, total_chars: usize) -> f64 {
    if total_chars == 0 {
        return 0.0;
    }
    (100.0 * correct_chars as f64) / total_chars as f64
}
