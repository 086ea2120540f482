//! Object key derivation.
//!
//! Upload and download must agree on the key, so every path that names an
//! object goes through [`slugify`].

/// Normalize an arbitrary string into a lowercase, hyphen-separated token
/// containing only `[a-z0-9-]`, with no leading, trailing or repeated hyphens.
///
/// Common Latin accented letters are folded to their ASCII base letter; any
/// other character acts as a separator.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_separator = false;

    for c in input.chars().flat_map(char::to_lowercase) {
        let c = fold_diacritic(c);
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c);
        } else {
            pending_separator = true;
        }
    }

    slug
}

/// Key for a file stored through the server: the timestamp prefix makes
/// collisions between identically named uploads unlikely, not impossible.
pub fn timestamped_key(timestamp_millis: i64, file_name: &str) -> String {
    slugify(&format!("{}-{}", timestamp_millis, file_name))
}

fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        _ => c,
    }
}
