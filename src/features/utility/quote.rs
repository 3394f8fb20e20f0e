//! Shell-style word splitting

/// Split on whitespace, honoring quotes and backslash escapes
///
/// Single quotes keep everything literally. Inside double quotes a backslash
/// only escapes `"` and `\`. Returns `None` for an unterminated quote or a
/// trailing backslash.
pub fn shell_split(input: &str) -> Option<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_word = true;
                loop {
                    match chars.next()? {
                        '\'' => break,
                        c => current.push(c),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next()? {
                        '"' => break,
                        '\\' => {
                            let escaped = chars.next()?;
                            if !matches!(escaped, '"' | '\\') {
                                current.push('\\');
                            }
                            current.push(escaped);
                        }
                        c => current.push(c),
                    }
                }
            }
            '\\' => {
                in_word = true;
                current.push(chars.next()?);
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }

    if in_word {
        words.push(current);
    }
    Some(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_words() {
        assert_eq!(shell_split("a  b\tc").unwrap(), vec!["a", "b", "c"]);
        assert_eq!(shell_split("   ").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_quotes() {
        assert_eq!(
            shell_split(r#"one "two three" 'four  five'"#).unwrap(),
            vec!["one", "two three", "four  five"]
        );
        assert_eq!(shell_split(r#"a"b c"d"#).unwrap(), vec!["ab cd"]);
        assert_eq!(shell_split("''").unwrap(), vec![""]);
    }

    #[test]
    fn test_escapes() {
        assert_eq!(shell_split(r#"a\ b "say \"hi\"""#).unwrap(), vec!["a b", r#"say "hi""#]);
        assert_eq!(shell_split(r#""\n""#).unwrap(), vec![r"\n"]);
    }

    #[test]
    fn test_unbalanced() {
        assert_eq!(shell_split("\"open"), None);
        assert_eq!(shell_split("it's"), None);
        assert_eq!(shell_split("trailing\\"), None);
    }
}
