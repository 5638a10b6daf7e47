//! Decoded line events

/// One physical line read from the tailed file, terminator included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEvent {
    text: String,
    offset: u64,
}

impl LineEvent {
    /// Decode raw line bytes, replacing invalid sequences with U+FFFD.
    pub fn decode(bytes: &[u8], offset: u64) -> Self {
        Self {
            text: String::from_utf8_lossy(bytes).into_owned(),
            offset,
        }
    }

    /// The decoded line, including its trailing `\n`
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Wire representation of the line
    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    /// Byte offset of the start of this line within the file it was read from
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Length of the encoded line in bytes
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl std::fmt::Display for LineEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
