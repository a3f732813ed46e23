//! Structural equality.
//!
//! Every dedup decision in the engine goes through [`equal`]. Two nodes are
//! equal when their canonical prints match: origins, raw literal text,
//! comments and layout never take part, so a node parsed from the user's file
//! compares equal to the same node built from a snippet.
//!
//! Equality is purely syntactic. `f(a, b)` and `f(b, a)` are different nodes
//! even when the call is commutative.

/// Position- and formatting-free rendering used for comparison.
pub trait Canonical {
    fn canonical(&self) -> String;
}

/// Structural equality of two nodes of the same kind.
pub fn equal<T: Canonical + ?Sized>(a: &T, b: &T) -> bool {
    a.canonical() == b.canonical()
}

impl<T: Canonical> Canonical for [T] {
    fn canonical(&self) -> String {
        let parts: Vec<String> = self.iter().map(Canonical::canonical).collect();
        parts.join("\u{1f}")
    }
}

impl<T: Canonical> Canonical for Vec<T> {
    fn canonical(&self) -> String {
        self.as_slice().canonical()
    }
}

/// Collapse whitespace runs so that the same verbatim fragment compares equal
/// regardless of the indentation it was written at. Quoted strings and
/// template literals are copied untouched.
pub(crate) fn squash_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut pending_space = false;

    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(c);
        if matches!(c, '\'' | '"' | '`') {
            while let Some(inner) = chars.next() {
                out.push(inner);
                if inner == '\\' {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                } else if inner == c {
                    break;
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Text(&'static str);

    impl Canonical for Text {
        fn canonical(&self) -> String {
            squash_whitespace(self.0)
        }
    }

    #[test]
    fn equality_is_reflexive_and_symmetric() {
        let a = Text("foo(\n\t1,\n\t2\n)");
        let b = Text("foo( 1, 2 )");
        assert!(equal(&a, &a));
        assert_eq!(equal(&a, &b), equal(&b, &a));
    }

    #[test]
    fn squash_keeps_string_contents() {
        assert_eq!(squash_whitespace("  a  +\n\tb "), "a + b");
        assert_eq!(squash_whitespace("f('a   b')"), "f('a   b')");
        assert_eq!(squash_whitespace("x = `\n  y`"), "x = `\n  y`");
    }
}
