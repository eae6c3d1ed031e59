//! Adaptive truncation of page text to a size budget.

/// Why text could not be brought under budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShrinkError<E> {
    /// The next truncation would go below the minimum viable length.
    Unfittable,
    /// The size check itself failed.
    Check(E),
}

/// Truncate `text` by `factor` (in characters) until `fits` accepts it.
///
/// Returns the first candidate that fits, possibly `text` unchanged. Stops
/// with [`ShrinkError::Unfittable`] once the next length would drop below
/// `min_len` (at least 1).
pub fn shrink_until_fits<F, E>(
    text: &str,
    mut fits: F,
    factor: f64,
    min_len: usize,
) -> Result<String, ShrinkError<E>>
where
    F: FnMut(&str) -> Result<bool, E>,
{
    let min_len = min_len.max(1);
    let mut candidate = text.to_string();
    let mut len = candidate.chars().count();

    while !fits(&candidate).map_err(ShrinkError::Check)? {
        // Always make progress, even with a factor of 1 or more.
        let new_len = ((len as f64 * factor).floor() as usize).min(len.saturating_sub(1));
        if new_len < min_len {
            return Err(ShrinkError::Unfittable);
        }
        truncate_chars(&mut candidate, new_len);
        len = new_len;
    }
    Ok(candidate)
}

/// Keep the first `n` characters of `s`.
pub fn truncate_chars(s: &mut String, n: usize) {
    if let Some((idx, _)) = s.char_indices().nth(n) {
        s.truncate(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn under(limit: usize) -> impl FnMut(&str) -> Result<bool, Infallible> {
        move |s: &str| Ok(s.chars().count() <= limit)
    }

    #[test]
    fn test_fitting_text_is_untouched() {
        assert_eq!(shrink_until_fits("short", under(10), 0.7, 1), Ok("short".to_string()));
    }

    #[test]
    fn test_shrinks_geometrically() {
        let text = "x".repeat(10_000);
        let mut checks = Vec::new();
        let result = shrink_until_fits(
            &text,
            |s: &str| {
                checks.push(s.len());
                Ok::<_, Infallible>(s.len() <= 4_000)
            },
            0.7,
            1,
        )
        .unwrap();

        // 10000 -> ~7000 -> ~4900 -> ~3430
        assert_eq!(checks.len(), 4);
        assert_eq!(checks[0], 10_000);
        for pair in checks.windows(2) {
            assert!(pair[1] as f64 <= pair[0] as f64 * 0.7);
        }
        assert!(result.len() <= 4_000 && result.len() > 3_400);
    }

    #[test]
    fn test_unfittable_below_minimum() {
        let result = shrink_until_fits("abcdefghij", under(0), 0.5, 3);
        assert_eq!(result, Err(ShrinkError::Unfittable));
    }

    #[test]
    fn test_always_terminates_with_large_factor() {
        let result = shrink_until_fits("abcdef", under(2), 1.5, 1);
        assert_eq!(result, Ok("ab".to_string()));
    }

    #[test]
    fn test_check_error_is_propagated() {
        let result = shrink_until_fits("abc", |_: &str| Err::<bool, _>("no tokenizer"), 0.7, 1);
        assert_eq!(result, Err(ShrinkError::Check("no tokenizer")));
    }

    #[test]
    fn test_truncates_on_char_boundaries() {
        let mut s = "héllo wörld".to_string();
        truncate_chars(&mut s, 7);
        assert_eq!(s, "héllo w");

        let result = shrink_until_fits("ééééé", under(2), 0.5, 1).unwrap();
        assert_eq!(result, "éé");
    }
}
