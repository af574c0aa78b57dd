use crate::error::CommonRequestError;

/// Splits a chunked byte stream into text lines
///
/// Network chunks do not respect line boundaries, so bytes are buffered until
/// a `\n` arrives. A trailing `\r` is dropped with the terminator. UTF-8 is
/// only decoded per complete line, so a multi-byte character split across two
/// chunks is reassembled before decoding.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a network chunk
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Take the next complete line out of the buffer
    pub fn next_line(&mut self) -> Result<Option<String>, CommonRequestError> {
        let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') else {
            return Ok(None);
        };

        let mut line_bytes = self.buffer.drain(..=pos).collect::<Vec<u8>>();
        line_bytes.pop();
        if line_bytes.last() == Some(&b'\r') {
            line_bytes.pop();
        }

        Ok(Some(String::from_utf8(line_bytes)?))
    }

    /// Flush whatever is left once the stream has ended
    pub fn finish(&mut self) -> Result<Option<String>, CommonRequestError> {
        if self.buffer.is_empty() {
            return Ok(None);
        }

        let mut line_bytes = std::mem::take(&mut self.buffer);
        if line_bytes.last() == Some(&b'\r') {
            line_bytes.pop();
        }

        Ok(Some(String::from_utf8(line_bytes)?))
    }
}
