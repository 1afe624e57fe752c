use std::ops::Range;
use thiserror::Error;

/// How a [`PatchDescriptor`] locates the bytes it replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchKind {
    /// Replace the first literal occurrence of `token`.
    ReplaceOne,
    /// Replace the body of `function <token>(...) { ... }`, braces included.
    ExplicitFunction,
}

/// A single patch. Both payloads borrow from data owned elsewhere, usually a
/// loaded patch table or static strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchDescriptor<'a> {
    pub kind: PatchKind,
    /// Literal to find (`ReplaceOne`) or function name (`ExplicitFunction`).
    /// Also the identifier reported when the patch misses.
    pub token: &'a str,
    /// Bytes that take the place of the matched region.
    pub replacement: &'a str,
}

impl<'a> PatchDescriptor<'a> {
    pub const fn replace_one(token: &'a str, replacement: &'a str) -> Self {
        Self {
            kind: PatchKind::ReplaceOne,
            token,
            replacement,
        }
    }

    /// `replacement` is expected to start with `{` and end with `}`.
    pub const fn explicit_function(name: &'a str, replacement: &'a str) -> Self {
        Self {
            kind: PatchKind::ExplicitFunction,
            token: name,
            replacement,
        }
    }

    /// Byte range this patch would replace in `haystack`, if it matches.
    pub fn locate(&self, haystack: &[u8]) -> Option<Range<usize>> {
        match self.kind {
            PatchKind::ReplaceOne => {
                let start = find_bytes(haystack, self.token.as_bytes())?;
                Some(start..start + self.token.len())
            }
            PatchKind::ExplicitFunction => find_function_body(haystack, self.token),
        }
    }
}

/// The descriptor whose token could not be located.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("patch token not found: {token}")]
pub struct PatchMiss<'a> {
    pub token: &'a str,
}

/// Apply `patches` to `buffer` in order.
///
/// Each patch rescans the buffer as left by the previous ones. On the first
/// miss the buffer keeps the mutations made so far and the remaining patches
/// are not attempted.
pub fn apply<'a>(
    buffer: &mut Vec<u8>,
    patches: &[PatchDescriptor<'a>],
) -> Result<(), PatchMiss<'a>> {
    for patch in patches {
        let span = patch
            .locate(buffer)
            .ok_or(PatchMiss { token: patch.token })?;
        buffer.splice(span, patch.replacement.bytes());
    }
    Ok(())
}

/// Locate the body of a function written as `function <name>(...) {...}`.
///
/// The returned range starts at the first `{` after the `function <name>(`
/// anchor and ends just past the `}` that brings the brace depth back to
/// zero. Braces inside string, regex or template literals and comments are
/// counted like any other.
pub fn find_function_body(haystack: &[u8], name: &str) -> Option<Range<usize>> {
    let anchor = format!("function {name}(");
    let definition = find_bytes(haystack, anchor.as_bytes())?;

    let begin = definition + haystack[definition..].iter().position(|&b| b == b'{')?;

    let mut depth = 0usize;
    for (offset, &byte) in haystack[begin..].iter().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(begin..begin + offset + 1);
                }
            }
            _ => {}
        }
    }

    None
}

/// First occurrence of `needle` in `haystack`. An empty needle matches at 0.
fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patched(input: &str, patches: &[PatchDescriptor<'_>]) -> (String, Option<String>) {
        let mut buffer = input.as_bytes().to_vec();
        let miss = apply(&mut buffer, patches)
            .err()
            .map(|miss| miss.token.to_string());
        (String::from_utf8(buffer).unwrap(), miss)
    }

    #[test]
    fn test_replace_one_first_occurrence_only() {
        let patch = PatchDescriptor::replace_one("X", "YY");
        let (once, miss) = patched("aXbXc", &[patch]);
        assert_eq!(once, "aYYbXc");
        assert!(miss.is_none());

        let (twice, miss) = patched(&once, &[patch]);
        assert_eq!(twice, "aYYbYYc");
        assert!(miss.is_none());

        let (_, miss) = patched(&twice, &[patch]);
        assert_eq!(miss.as_deref(), Some("X"));
    }

    #[test]
    fn test_replace_one_miss_leaves_buffer() {
        let (out, miss) = patched("abc", &[PatchDescriptor::replace_one("Z", "!")]);
        assert_eq!(out, "abc");
        assert_eq!(miss.as_deref(), Some("Z"));
    }

    #[test]
    fn test_replace_one_empty_token_inserts_at_start() {
        let (out, miss) = patched("abc", &[PatchDescriptor::replace_one("", ">")]);
        assert_eq!(out, ">abc");
        assert!(miss.is_none());
    }

    #[test]
    fn test_replace_one_is_case_sensitive() {
        let (out, miss) = patched("Token", &[PatchDescriptor::replace_one("token", "x")]);
        assert_eq!(out, "Token");
        assert_eq!(miss.as_deref(), Some("token"));
    }

    #[test]
    fn test_explicit_function_body() {
        let (out, miss) = patched(
            "x; function foo(a,b) { if(a){b();} return 1; } y",
            &[PatchDescriptor::explicit_function("foo", "{return 0;}")],
        );
        assert_eq!(out, "x; function foo(a,b) {return 0;} y");
        assert!(miss.is_none());
    }

    #[test]
    fn test_explicit_function_nested_braces_at_end_of_buffer() {
        let (out, miss) = patched(
            "function g() { {{}} }",
            &[PatchDescriptor::explicit_function("g", "{}")],
        );
        assert_eq!(out, "function g() {}");
        assert!(miss.is_none());
    }

    #[test]
    fn test_explicit_function_not_found() {
        let (out, miss) = patched(
            "function bar(){}",
            &[PatchDescriptor::explicit_function("baz", "{}")],
        );
        assert_eq!(out, "function bar(){}");
        assert_eq!(miss.as_deref(), Some("baz"));
    }

    #[test]
    fn test_explicit_function_requires_single_space() {
        let (_, miss) = patched(
            "function  foo(){}",
            &[PatchDescriptor::explicit_function("foo", "{}")],
        );
        assert_eq!(miss.as_deref(), Some("foo"));
    }

    #[test]
    fn test_explicit_function_name_prefix_is_not_a_match() {
        // `function foobar(` does not contain the `function foo(` anchor.
        let (out, miss) = patched(
            "function foobar(){a} function foo(){b}",
            &[PatchDescriptor::explicit_function("foo", "{c}")],
        );
        assert_eq!(out, "function foobar(){a} function foo(){c}");
        assert!(miss.is_none());
    }

    #[test]
    fn test_explicit_function_unbalanced_fails() {
        let (out, miss) = patched(
            "function f(){ if(x){ ",
            &[PatchDescriptor::explicit_function("f", "{}")],
        );
        assert_eq!(out, "function f(){ if(x){ ");
        assert_eq!(miss.as_deref(), Some("f"));
    }

    #[test]
    fn test_explicit_function_without_body_fails() {
        let (_, miss) = patched(
            "function f(a, b);",
            &[PatchDescriptor::explicit_function("f", "{}")],
        );
        assert_eq!(miss.as_deref(), Some("f"));
    }

    #[test]
    fn test_brace_scan_counts_braces_in_string_literals() {
        // The "}" inside the string closes the body early.
        let (out, miss) = patched(
            r#"function f(){ var s = "}"; return s; }"#,
            &[PatchDescriptor::explicit_function("f", "{X}")],
        );
        assert_eq!(out, r#"function f(){X}"; return s; }"#);
        assert!(miss.is_none());
    }

    #[test]
    fn test_stops_at_first_failure() {
        let (out, miss) = patched(
            "AB",
            &[
                PatchDescriptor::replace_one("A", "A1"),
                PatchDescriptor::replace_one("Z", "Z1"),
                PatchDescriptor::replace_one("B", "B1"),
            ],
        );
        assert_eq!(out, "A1B");
        assert_eq!(miss.as_deref(), Some("Z"));
    }

    #[test]
    fn test_later_patch_sees_earlier_replacement() {
        let (out, miss) = patched(
            "start",
            &[
                PatchDescriptor::replace_one("start", "function h(){old}"),
                PatchDescriptor::explicit_function("h", "{new}"),
            ],
        );
        assert_eq!(out, "function h(){new}");
        assert!(miss.is_none());
    }

    #[test]
    fn test_multibyte_utf8_preserved() {
        let (out, miss) = patched(
            "é function ü(){ß} ☃",
            &[PatchDescriptor::explicit_function("ü", "{ok}")],
        );
        assert_eq!(out, "é function ü(){ok} ☃");
        assert!(miss.is_none());
    }

    #[test]
    fn test_non_utf8_bytes_outside_span_survive() {
        let mut buffer = vec![0xff, b'a', b'X', 0xfe];
        apply(&mut buffer, &[PatchDescriptor::replace_one("X", "YZ")]).unwrap();
        assert_eq!(buffer, vec![0xff, b'a', b'Y', b'Z', 0xfe]);
    }

    #[test]
    fn test_find_function_body_span() {
        let haystack = b"var a; function foo(x) { return {a:1}; } // tail";
        let span = find_function_body(haystack, "foo").unwrap();
        assert_eq!(&haystack[span], b"{ return {a:1}; }".as_slice());
    }

    #[test]
    fn test_miss_display() {
        let miss = PatchMiss { token: "renderHeader" };
        assert_eq!(miss.to_string(), "patch token not found: renderHeader");
    }
}
