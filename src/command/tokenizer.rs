use crate::Error;

/// Characters a backslash escapes inside double quotes.
const DOUBLE_QUOTE_ESCAPES: [char; 4] = ['"', '\\', '$', '`'];

#[derive(Clone, Copy, PartialEq)]
enum Quote {
    None,
    Single,
    Double,
}

/// Splits a command line into words the way a POSIX shell does: whitespace
/// separates words, quotes group them and a backslash escapes the next
/// character.
pub fn split(line: &str) -> crate::Result<Vec<String>> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut quote = Quote::None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match quote {
            Quote::Single => {
                if c == '\'' {
                    quote = Quote::None;
                } else {
                    word.push(c);
                }
            }
            Quote::Double => match c {
                '"' => quote = Quote::None,
                '\\' => {
                    let escaped = chars
                        .next()
                        .ok_or(Error::InvalidCommandLine("unterminated double quote"))?;
                    // an escaped newline continues the line
                    if escaped == '\n' {
                        continue;
                    }
                    if !DOUBLE_QUOTE_ESCAPES.contains(&escaped) {
                        word.push('\\');
                    }
                    word.push(escaped);
                }
                _ => word.push(c),
            },
            Quote::None => match c {
                '\'' => {
                    quote = Quote::Single;
                    in_word = true;
                }
                '"' => {
                    quote = Quote::Double;
                    in_word = true;
                }
                '\\' => {
                    let escaped = chars
                        .next()
                        .ok_or(Error::InvalidCommandLine("trailing backslash"))?;
                    word.push(escaped);
                    in_word = true;
                }
                c if c.is_whitespace() => {
                    if in_word {
                        words.push(std::mem::take(&mut word));
                        in_word = false;
                    }
                }
                _ => {
                    word.push(c);
                    in_word = true;
                }
            },
        }
    }

    match quote {
        Quote::Single => Err(Error::InvalidCommandLine("unterminated single quote")),
        Quote::Double => Err(Error::InvalidCommandLine("unterminated double quote")),
        Quote::None => {
            if in_word {
                words.push(word);
            }
            Ok(words)
        }
    }
}

#[cfg(test)]
mod test {
    use super::split;
    use crate::Error;

    #[test]
    fn split_on_whitespace() {
        assert_eq!(split("  -w  view\timg ").unwrap(), vec!["-w", "view", "img"]);
    }

    #[test]
    fn empty_line() {
        assert!(split("   ").unwrap().is_empty());
    }

    #[test]
    fn quotes_group_words() {
        assert_eq!(
            split("-w 'my window' \"second one\"").unwrap(),
            vec!["-w", "my window", "second one"]
        );
    }

    #[test]
    fn adjacent_quotes_join() {
        assert_eq!(split("a'b c'\"d\"").unwrap(), vec!["ab cd"]);
    }

    #[test]
    fn empty_quotes_give_empty_word() {
        assert_eq!(split("-w ''").unwrap(), vec!["-w", ""]);
    }

    #[test]
    fn backslash_escapes() {
        assert_eq!(split(r"a\ b").unwrap(), vec!["a b"]);
        assert_eq!(split(r#""say \"hi\"""#).unwrap(), vec![r#"say "hi""#]);
        assert_eq!(split(r#""C:\tmp""#).unwrap(), vec![r"C:\tmp"]);
        assert_eq!(split(r"'no \escape'").unwrap(), vec![r"no \escape"]);
    }

    #[test]
    fn double_quote_escapes() {
        assert_eq!(split(r#""cost \$5""#).unwrap(), vec!["cost $5"]);
        assert_eq!(split(r#""\`date\`""#).unwrap(), vec!["`date`"]);
        assert_eq!(split("\"one\\\ntwo\"").unwrap(), vec!["onetwo"]);
        assert_eq!(split(r#""a\nb""#).unwrap(), vec![r"a\nb"]);
    }

    #[test]
    fn unterminated_quote() {
        assert!(matches!(
            split("-w 'open"),
            Err(Error::InvalidCommandLine("unterminated single quote"))
        ));
        assert!(matches!(
            split("\"open"),
            Err(Error::InvalidCommandLine("unterminated double quote"))
        ));
    }

    #[test]
    fn trailing_backslash() {
        assert!(matches!(
            split("img\\"),
            Err(Error::InvalidCommandLine("trailing backslash"))
        ));
    }
}
