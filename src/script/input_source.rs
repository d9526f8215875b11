use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputPosition {
    pub line: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSpan {
    pub begin: InputPosition,
    pub end: InputPosition,
}

impl InputSpan {
    #[inline]
    pub fn from_positions(begin: InputPosition, end: InputPosition) -> Self {
        Self { begin, end }
    }
}

impl fmt::Display for InputSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.begin.line, self.begin.offset)
    }
}

/// Wrapper around the script text, scanned once from front to back by the
/// tokenizer.
pub struct InputSource<'a> {
    pub(crate) input: &'a [u8],
    line: u32,
    offset: usize,
}

impl<'a> InputSource<'a> {
    pub fn new(input: &'a str) -> Self {
        Self{
            input: input.as_bytes(),
            line: 1,
            offset: 0,
        }
    }

    #[inline]
    pub fn pos(&self) -> InputPosition {
        InputPosition { line: self.line, offset: self.offset as u32 }
    }

    pub fn next(&self) -> Option<u8> {
        if self.offset < self.input.len() {
            Some(self.input[self.offset])
        } else {
            None
        }
    }

    pub fn lookahead(&self, offset: usize) -> Option<u8> {
        let offset_pos = self.offset + offset;
        if offset_pos < self.input.len() {
            Some(self.input[offset_pos])
        } else {
            None
        }
    }

    /// Returns the text between two positions. Positions produced by the
    /// tokenizer always lie on character boundaries.
    pub fn section_at_pos(&self, start: InputPosition, end: InputPosition) -> &'a str {
        let bytes = &self.input[start.offset as usize..end.offset as usize];
        std::str::from_utf8(bytes).unwrap_or("")
    }

    /// Consumes a single character, which may span multiple bytes.
    pub fn consume(&mut self) {
        if let Some(c) = self.next() {
            if c == b'\n' {
                self.line += 1;
            }
            self.offset += utf8_width(c);
            if self.offset > self.input.len() {
                self.offset = self.input.len();
            }
        }
    }
}

fn utf8_width(first_byte: u8) -> usize {
    if first_byte < 0x80 {
        1
    } else if first_byte >> 5 == 0b110 {
        2
    } else if first_byte >> 4 == 0b1110 {
        3
    } else if first_byte >> 3 == 0b11110 {
        4
    } else {
        1
    }
}
