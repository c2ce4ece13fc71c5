/// Characters replaced by [`sanitize_filename`].
pub const UNSAFE_FILENAME_CHARS: [char; 11] =
    ['<', '>', ':', '"', '/', '\\', '|', '?', '*', '\'', '`'];

/// Replace every filesystem-unsafe character in `title` with `_`.
///
/// Replacement is one-for-one, so runs of unsafe characters are not collapsed
/// and the output has the same number of characters as the input. Everything
/// outside [`UNSAFE_FILENAME_CHARS`], including non-ASCII text, is kept as is.
pub fn sanitize_filename(title: &str) -> String {
    title
        .chars()
        .map(|ch| {
            if UNSAFE_FILENAME_CHARS.contains(&ch) {
                '_'
            } else {
                ch
            }
        })
        .collect()
}
