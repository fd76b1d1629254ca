/// A word inside a piece of text, as byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordSpan {
    pub start: usize,
    pub end: usize,
}

impl WordSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

fn is_apostrophe(c: char) -> bool {
    c == '\'' || c == '\u{2019}'
}

/// Splits `text` into words at Pango's word boundaries. Two words separated
/// by a single apostrophe between letters ("don't") are joined.
pub fn split_words(text: &str) -> Vec<WordSpan> {
    if text.is_empty() {
        return Vec::new();
    }

    // log attributes are indexed by character, with one past the end
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(text.len()))
        .collect();
    let attrs = pango::log_attrs(text, -1, &pango::Language::default());

    let mut spans = Vec::new();
    let mut start: Option<usize> = None;
    for (attr, &offset) in attrs.iter().zip(&offsets) {
        if attr.is_word_end() {
            if let Some(word_start) = start.take() {
                spans.push(WordSpan::new(word_start, offset));
            }
        }
        if attr.is_word_start() {
            start = Some(offset);
        }
    }
    if let Some(word_start) = start {
        spans.push(WordSpan::new(word_start, text.len()));
    }

    join_apostrophes(text, spans)
}

fn join_apostrophes(text: &str, spans: Vec<WordSpan>) -> Vec<WordSpan> {
    let mut joined: Vec<WordSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        if let Some(last) = joined.last_mut() {
            let mut gap = text[last.end..span.start].chars();
            let single_apostrophe = gap.next().is_some_and(is_apostrophe) && gap.next().is_none();
            let between_letters = text[..last.end]
                .chars()
                .next_back()
                .is_some_and(char::is_alphabetic)
                && text[span.start..].chars().next().is_some_and(char::is_alphabetic);
            if single_apostrophe && between_letters {
                last.end = span.end;
                continue;
            }
        }
        joined.push(span);
    }
    joined
}

/// Returns the word containing `byte_pos`, where a position touching either
/// end of a word counts as inside it.
pub fn word_at(spans: &[WordSpan], byte_pos: usize) -> Option<WordSpan> {
    spans
        .iter()
        .find(|span| byte_pos >= span.start && byte_pos <= span.end)
        .copied()
}

pub fn char_to_byte(text: &str, char_pos: usize) -> usize {
    text.char_indices()
        .nth(char_pos)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len())
}

pub fn byte_to_char(text: &str, byte_pos: usize) -> usize {
    let byte_pos = byte_pos.min(text.len());
    text.char_indices()
        .take_while(|(offset, _)| *offset < byte_pos)
        .count()
}
