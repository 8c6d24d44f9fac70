/// Raised whenever a read runs past the end of the underlying buffer.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("unexpected end of input at offset {0}")]
pub struct UnexpectedEof(pub usize);

/// Forward-only big-endian reader over a byte buffer.
pub(crate) struct ClassFileIterator<'b> {
    bytes: &'b [u8],
    offset: usize,
}

impl<'b> ClassFileIterator<'b> {
    pub(crate) fn new(bytes: &'b [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub(crate) fn take_bytes(&mut self, count: usize) -> Result<&'b [u8], UnexpectedEof> {
        if count > self.remaining() {
            Err(UnexpectedEof(self.offset))
        } else {
            let bytes = &self.bytes[self.offset..self.offset + count];
            self.offset += count;
            Ok(bytes)
        }
    }

    pub(crate) fn skip_bytes(&mut self, count: usize) -> Result<(), UnexpectedEof> {
        self.take_bytes(count).map(|_| ())
    }

    pub(crate) fn byte(&mut self) -> Result<u8, UnexpectedEof> {
        let byte = self
            .bytes
            .get(self.offset)
            .copied()
            .ok_or(UnexpectedEof(self.offset))?;
        self.offset += 1;
        Ok(byte)
    }

    pub(crate) fn i8(&mut self) -> Result<i8, UnexpectedEof> {
        Ok(i8::from_be_bytes([self.byte()?]))
    }

    pub(crate) fn u16(&mut self) -> Result<u16, UnexpectedEof> {
        Ok(u16::from_be_bytes([self.byte()?, self.byte()?]))
    }

    pub(crate) fn i16(&mut self) -> Result<i16, UnexpectedEof> {
        Ok(i16::from_be_bytes([self.byte()?, self.byte()?]))
    }

    pub(crate) fn u32(&mut self) -> Result<u32, UnexpectedEof> {
        Ok(u32::from_be_bytes([
            self.byte()?,
            self.byte()?,
            self.byte()?,
            self.byte()?,
        ]))
    }
}
