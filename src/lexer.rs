//! Splitting of a raw input line into a command name and its arguments.
//!
//! The only separator is the ASCII space. There is no quoting, escaping or
//! substitution: every maximal run of non-space characters becomes one token.

/// Separator between tokens.
const SEPARATOR: char = ' ';

/// Splits `line` into whitespace-delimited tokens.
///
/// Runs of spaces never produce empty tokens, and leading or trailing spaces
/// are dropped. A blank line yields an empty vector. Other whitespace, such as
/// a tab, is kept as part of the token it appears in.
///
/// ```
/// use tinysh::lexer::split_into_tokens;
/// assert_eq!(split_into_tokens("  ls  -a "), vec!["ls", "-a"]);
/// assert!(split_into_tokens("   ").is_empty());
/// ```
pub fn split_into_tokens(line: &str) -> Vec<String> {
    line.split(SEPARATOR)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_and_blank_lines() {
        assert!(split_into_tokens("").is_empty());
        assert!(split_into_tokens("   ").is_empty());
    }

    #[test]
    fn test_command_with_flag() {
        assert_eq!(split_into_tokens("ls -a"), vec!["ls", "-a"]);
    }

    #[test]
    fn test_collapses_space_runs() {
        assert_eq!(
            split_into_tokens("  cd    /tmp   "),
            vec!["cd".to_string(), "/tmp".to_string()]
        );
    }

    #[test]
    fn test_tab_is_not_a_separator() {
        assert_eq!(split_into_tokens("echo\thi there"), vec!["echo\thi", "there"]);
    }

    #[test]
    fn test_quotes_are_literal() {
        assert_eq!(
            split_into_tokens("echo \"a b\""),
            vec!["echo", "\"a", "b\""]
        );
    }

    proptest! {
        #[test]
        fn token_count_matches_non_space_runs(line in "[a-z \\-./]{0,40}") {
            let runs = line
                .as_bytes()
                .iter()
                .enumerate()
                .filter(|(i, b)| **b != b' ' && (*i == 0 || line.as_bytes()[i - 1] == b' '))
                .count();
            prop_assert_eq!(split_into_tokens(&line).len(), runs);
        }

        #[test]
        fn tokens_are_never_empty_and_contain_no_spaces(line in ".{0,40}") {
            for token in split_into_tokens(&line) {
                prop_assert!(!token.is_empty());
                prop_assert!(!token.contains(' '));
            }
        }

        #[test]
        fn padding_does_not_change_tokens(line in "[a-z ]{0,20}", left in 0usize..4, right in 0usize..4) {
            let padded = format!("{}{}{}", " ".repeat(left), line, " ".repeat(right));
            prop_assert_eq!(split_into_tokens(&padded), split_into_tokens(&line));
        }
    }
}
