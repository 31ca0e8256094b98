//! Single-name glob matching.
//!
//! Patterns here never see a path separator: `GlobPath` splits paths into
//! segments first and matches each one with [`glob_match`].
//!
//! | Syntax | Meaning |
//! |--------|---------|
//! | `*` | any run of characters, including none |
//! | `?` | exactly one character |
//! | `[abc]`, `[a-z]` | one character from the class |
//! | `[!a]`, `[^a]` | one character not in the class |
//! | `{a,b}` | either alternative (nestable) |
//! | `\x` | literal `x` |

/// True if `s` contains any glob metacharacter.
pub fn contains_glob(s: &str) -> bool {
    s.chars().any(|c| matches!(c, '*' | '?' | '[' | '{'))
}

/// Expand `{a,b}` alternatives into every concrete pattern.
///
/// Groups without a top-level comma (`{a}`) and unbalanced braces are kept
/// literally.
///
/// ```
/// use fsobj_glob::expand_braces;
/// assert_eq!(expand_braces("*.{rs,toml}"), vec!["*.rs", "*.toml"]);
/// ```
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut depth = 0usize;
    let mut open: Option<usize> = None;
    let mut commas: Vec<usize> = Vec::new();

    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                i += 2;
                continue;
            }
            '{' => {
                if depth == 0 {
                    open = Some(i);
                    commas.clear();
                }
                depth += 1;
            }
            ',' if depth == 1 => commas.push(i),
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(start) = open.take() {
                        if !commas.is_empty() {
                            return expand_group(&chars, start, &commas, i);
                        }
                    }
                }
            }
            _ => {}
        }
        i += 1;
    }

    vec![pattern.to_string()]
}

fn expand_group(chars: &[char], open: usize, commas: &[usize], close: usize) -> Vec<String> {
    let prefix: String = chars[..open].iter().collect();
    let suffix: String = chars[close + 1..].iter().collect();

    let mut bounds = Vec::with_capacity(commas.len() + 2);
    bounds.push(open);
    bounds.extend_from_slice(commas);
    bounds.push(close);

    let mut out = Vec::new();
    for pair in bounds.windows(2) {
        let alternative: String = chars[pair[0] + 1..pair[1]].iter().collect();
        out.extend(expand_braces(&format!("{prefix}{alternative}{suffix}")));
    }
    out
}

/// Match a single name against a glob pattern.
///
/// ```
/// use fsobj_glob::glob_match;
/// assert!(glob_match("*.rs", "main.rs"));
/// assert!(glob_match("file?.{txt,md}", "file1.md"));
/// assert!(!glob_match("[!a]*", "abc"));
/// ```
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    expand_braces(pattern).iter().any(|alternative| {
        let pat: Vec<char> = alternative.chars().collect();
        match_chars(&pat, &text)
    })
}

fn match_chars(pat: &[char], text: &[char]) -> bool {
    let (mut p, mut t) = (0usize, 0usize);
    // Position of the last `*` and the text index it is currently absorbing up to.
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pat.len() {
            match pat[p] {
                '*' => {
                    star = Some((p, t));
                    p += 1;
                    continue;
                }
                '?' => {
                    p += 1;
                    t += 1;
                    continue;
                }
                '[' => match match_class(pat, p, text[t]) {
                    Some((true, next)) => {
                        p = next;
                        t += 1;
                        continue;
                    }
                    Some((false, _)) => {}
                    // Unclosed class: the bracket is an ordinary character.
                    None => {
                        if text[t] == '[' {
                            p += 1;
                            t += 1;
                            continue;
                        }
                    }
                },
                '\\' if p + 1 < pat.len() => {
                    if pat[p + 1] == text[t] {
                        p += 2;
                        t += 1;
                        continue;
                    }
                }
                c => {
                    if c == text[t] {
                        p += 1;
                        t += 1;
                        continue;
                    }
                }
            }
        }

        match star {
            Some((star_p, star_t)) => {
                p = star_p + 1;
                t = star_t + 1;
                star = Some((star_p, star_t + 1));
            }
            None => return false,
        }
    }

    while p < pat.len() && pat[p] == '*' {
        p += 1;
    }
    p == pat.len()
}

/// Evaluate the character class opening at `start` against `ch`.
///
/// Returns `(matched, index after the closing bracket)`, or `None` if the
/// class never closes.
fn match_class(pat: &[char], start: usize, ch: char) -> Option<(bool, usize)> {
    let mut i = start + 1;
    let negate = i < pat.len() && matches!(pat[i], '!' | '^');
    if negate {
        i += 1;
    }

    let mut matched = false;
    let mut first = true;
    while i < pat.len() {
        let c = pat[i];
        if c == ']' && !first {
            return Some((matched != negate, i + 1));
        }
        first = false;

        let lo = if c == '\\' && i + 1 < pat.len() {
            i += 1;
            pat[i]
        } else {
            c
        };

        if i + 2 < pat.len() && pat[i + 1] == '-' && pat[i + 2] != ']' {
            let hi = pat[i + 2];
            if lo <= ch && ch <= hi {
                matched = true;
            }
            i += 3;
        } else {
            if lo == ch {
                matched = true;
            }
            i += 1;
        }
    }
    None
}

/// Find the first unclosed `[` in a pattern, if any.
pub(crate) fn has_unclosed_class(pattern: &str) -> bool {
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            '[' => match match_class(&chars, i, '\0') {
                Some((_, next)) => i = next,
                None => return true,
            },
            _ => i += 1,
        }
    }
    false
}

/// True if `{` and `}` pair up (escapes ignored).
pub(crate) fn braces_balanced(pattern: &str) -> bool {
    let mut depth = 0i64;
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}
