//! Run-time rendering of `{}` placeholders.
//!
//! Record formatting happens on the consumer thread, long after the call
//! site returned, so the format text has to be interpreted at run time.
//! The dialect is deliberately small: each `{}` consumes the next argument,
//! `{{` and `}}` produce literal braces. A surplus `{}` (more placeholders
//! than arguments) stays in the output verbatim; surplus arguments are
//! silently ignored.

use std::fmt::{Display, Write};

/// Renders `text`, substituting each `{}` with the next value in `args`.
pub(crate) fn render(text: &str, args: &[&dyn Display]) -> String {
    let mut out = String::with_capacity(text.len() + args.len() * 8);
    let mut next = 0;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '{' if chars.peek() == Some(&'}') && next < args.len() => {
                chars.next();
                // Writing into a String cannot fail.
                let _ = write!(out, "{}", args[next]);
                next += 1;
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            _ => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_passes_through() {
        assert_eq!(render("no placeholders here", &[]), "no placeholders here");
    }

    #[test]
    fn test_substitutes_in_order() {
        assert_eq!(render("{} + {} = {}", &[&1, &2, &3]), "1 + 2 = 3");
    }

    #[test]
    fn test_mixed_display_types() {
        let name = String::from("hermes");
        assert_eq!(
            render("Here we are: {} and my name is: {}", &[&7i64, &name]),
            "Here we are: 7 and my name is: hermes"
        );
    }

    #[test]
    fn test_escaped_braces() {
        assert_eq!(render("{{}} {} {{literal}}", &[&42]), "{} 42 {literal}");
    }

    #[test]
    fn test_surplus_placeholders_stay_literal() {
        assert_eq!(render("{} {}", &[&1]), "1 {}");
    }

    #[test]
    fn test_surplus_arguments_ignored() {
        assert_eq!(render("only {}", &[&1, &2]), "only 1");
    }

    #[test]
    fn test_empty_format() {
        assert_eq!(render("", &[&1]), "");
    }
}
