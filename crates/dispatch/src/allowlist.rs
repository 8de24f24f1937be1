/// Check whether `handle` appears on an allow-list.
///
/// Entries are matched case-insensitively, ignoring a leading `@` on either
/// side, and support glob-style `*` wildcards. An empty list allows nobody:
/// the lists guarded here protect privileged commands.
pub fn is_listed(handle: &str, allowlist: &[String]) -> bool {
    let handle = normalize(handle);
    if handle.is_empty() {
        return false;
    }
    allowlist.iter().any(|pattern| {
        let pat = normalize(pattern);
        if pat.contains('*') {
            glob_match(&pat, &handle)
        } else {
            pat == handle
        }
    })
}

fn normalize(s: &str) -> String {
    s.trim().trim_start_matches('@').to_lowercase()
}

/// `*` matches any run of characters, including none.
///
/// Greedy scan that backtracks to the most recent `*` on a mismatch.
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, t));
            p += 1;
        } else if p < pattern.len() && pattern[p] == text[t] {
            p += 1;
            t += 1;
        } else if let Some((star_p, star_t)) = star {
            p = star_p + 1;
            t = star_t + 1;
            star = Some((star_p, t));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|c| *c == '*')
}
