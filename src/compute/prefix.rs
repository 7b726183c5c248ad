//! Prefix index members.
//!
//! The prefix index is one lexicographically ordered set holding every
//! non-empty prefix of every valid key plus one terminal member per key (the
//! key followed by the terminal sigil). All members under a given prefix form
//! a contiguous run in that order, which is what the prefix scan relies on.

/// Iterate over the prefix index members contributed by `key`: its prefixes
/// from one character up to the full key, then the terminal member.
///
/// Prefixes are cut on character boundaries.
///
/// ```rust
/// use cityindex::compute::prefix::prefix_members;
///
/// let members: Vec<String> = prefix_members("nice-06", '*').collect();
/// assert_eq!(
///     members,
///     ["n", "ni", "nic", "nice", "nice-", "nice-0", "nice-06", "nice-06*"]
/// );
/// ```
pub fn prefix_members(key: &str, sigil: char) -> impl Iterator<Item = String> + '_ {
    key.char_indices()
        .map(move |(i, c)| key[..i + c.len_utf8()].to_string())
        .chain(std::iter::once(terminal_member(key, sigil)))
}

/// The member marking `key` as a complete city.
pub fn terminal_member(key: &str, sigil: char) -> String {
    let mut member = String::with_capacity(key.len() + sigil.len_utf8());
    member.push_str(key);
    member.push(sigil);
    member
}

/// Return the city key if `member` is a terminal member.
pub fn strip_terminal(member: &str, sigil: char) -> Option<&str> {
    member.strip_suffix(sigil)
}
