//! Splits a console line into words with shell-like quoting.
//!
//! `'...'` and `"..."` group text containing spaces into one word; quotes
//! may also appear inside a word (`Monitor" 27"` is `Monitor 27`). There are
//! no escapes or substitutions.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexingError {
    /// A closing quote (single or double) was not found.
    #[error("unfinished quote")]
    UnfinishedQuote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingWord,
    ReadingSingleQuote,
    ReadingDoubleQuote,
}

struct LexingFSM<'a> {
    input: std::str::Chars<'a>,
    state: LexingState,
    buffer: String,
    words: Vec<String>,
}

impl<'a> LexingFSM<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            input: line.chars(),
            state: LexingState::Start,
            buffer: String::new(),
            words: Vec::new(),
        }
    }

    fn make_words(mut self) -> Result<Vec<String>, LexingError> {
        while let Some(ch) = self.input.next() {
            match self.state {
                LexingState::Start => self.handle_start(ch),
                LexingState::ReadingWord => self.handle_word(ch),
                LexingState::ReadingSingleQuote => self.handle_quoted(ch, '\''),
                LexingState::ReadingDoubleQuote => self.handle_quoted(ch, '"'),
            }
        }

        match self.state {
            LexingState::ReadingSingleQuote | LexingState::ReadingDoubleQuote => {
                Err(LexingError::UnfinishedQuote)
            }
            LexingState::ReadingWord => {
                self.finish_word();
                Ok(self.words)
            }
            LexingState::Start => Ok(self.words),
        }
    }

    fn handle_start(&mut self, ch: char) {
        match ch {
            c if c.is_whitespace() => {}
            '\'' => self.state = LexingState::ReadingSingleQuote,
            '"' => self.state = LexingState::ReadingDoubleQuote,
            c => {
                self.buffer.push(c);
                self.state = LexingState::ReadingWord;
            }
        }
    }

    fn handle_word(&mut self, ch: char) {
        match ch {
            c if c.is_whitespace() => {
                self.finish_word();
                self.state = LexingState::Start;
            }
            '\'' => self.state = LexingState::ReadingSingleQuote,
            '"' => self.state = LexingState::ReadingDoubleQuote,
            c => self.buffer.push(c),
        }
    }

    fn handle_quoted(&mut self, ch: char, quote: char) {
        if ch == quote {
            // `""` still produces a word, possibly empty.
            self.state = LexingState::ReadingWord;
        } else {
            self.buffer.push(ch);
        }
    }

    fn finish_word(&mut self) {
        self.words.push(std::mem::take(&mut self.buffer));
    }
}

/// Tokenize `line` into words.
pub fn split_into_words(line: &str) -> Result<Vec<String>, LexingError> {
    LexingFSM::new(line).make_words()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(line: &str) -> Vec<String> {
        split_into_words(line).unwrap()
    }

    #[test]
    fn test_plain_words() {
        assert_eq!(words("  add Mouse 10.5\t3 "), ["add", "Mouse", "10.5", "3"]);
        assert!(words("   ").is_empty());
    }

    #[test]
    fn test_quotes_group_spaces() {
        assert_eq!(
            words(r#"add "Mouse Gamer" 'USB hub'"#),
            ["add", "Mouse Gamer", "USB hub"]
        );
    }

    #[test]
    fn test_quote_inside_word_and_other_quote_kind() {
        assert_eq!(words(r#"Monitor" 27""#), ["Monitor 27"]);
        assert_eq!(words(r#"'Monitor 27"'"#), ["Monitor 27\""]);
    }

    #[test]
    fn test_empty_quotes_give_empty_word() {
        assert_eq!(words(r#"add "" 1"#), ["add", "", "1"]);
    }

    #[test]
    fn test_unfinished_quote() {
        assert_eq!(
            split_into_words("add \"Mouse"),
            Err(LexingError::UnfinishedQuote)
        );
        assert_eq!(split_into_words("'"), Err(LexingError::UnfinishedQuote));
    }
}
