//! Boot-complete detection.
//!
//! Boot is considered complete once a process named `quicklauncher` shows
//! up in the process table. Its `/proc/[pid]/stat` line starts with
//! `<pid> (quicklauncher) ...`, so the detector looks for the first space
//! near the start of a block and compares what follows against the marker.

/// Marker as it appears in a stat line, parentheses included.
pub const EXIT_MARKER: &[u8] = b"(quicklauncher)";

/// Number of positions searched for the space that precedes the marker.
///
/// Marker length plus five, i.e. 20. Sizing it from a NUL-terminated
/// marker (`sizeof` in C) gives 21; the one-position difference is known
/// and deliberate. Real PIDs (at most 7 digits) fit either way.
pub const LOOKAHEAD: usize = EXIT_MARKER.len() + 5;

/// Returns `false` when the block is refuted as the marker process.
///
/// The search for the space starts at index 1; byte 0 is never inspected
/// (a stat line always starts with a PID digit). When a space is found, the
/// bytes after it must equal `EXIT_MARKER`. The first differing byte, or the
/// block ending early, returns `false`.
///
/// If no space turns up within `LOOKAHEAD` positions, or the block ends
/// before one does, the result is `true`. A block without the delimiter is
/// therefore not refuted and stops sampling just like the marker itself.
/// That polarity is kept on purpose for compatibility with existing logs;
/// see `test_no_space_in_window_is_not_refuted`.
pub fn is_marker(window: &[u8]) -> bool {
    for pos in 1..=LOOKAHEAD {
        let Some(&byte) = window.get(pos) else {
            return true;
        };
        if byte != b' ' {
            continue;
        }

        let candidate = &window[pos + 1..];
        for (i, &expected) in EXIT_MARKER.iter().enumerate() {
            if candidate.get(i) != Some(&expected) {
                return false;
            }
        }
        return true;
    }
    true
}
