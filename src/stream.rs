use crate::error::{Result, StateError};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Largest blob a 2-byte length prefix can describe.
pub const MAX_PREFIXED_LEN: usize = u16::MAX as usize;

/// Little-endian writer used for every state payload.
pub struct ByteWriter {
    buffer: BytesMut,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.put_u8(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buffer.put_u16_le(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buffer.put_u32_le(value);
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buffer.put_u64_le(value);
    }

    pub fn write_f32(&mut self, value: f32) {
        self.buffer.put_f32_le(value);
    }

    /// Writes `data` behind a 2-byte length prefix.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        if data.len() > MAX_PREFIXED_LEN {
            return Err(StateError::BlobTooLarge {
                len: data.len(),
                max: MAX_PREFIXED_LEN,
            });
        }

        self.buffer.put_u16_le(data.len() as u16);
        self.buffer.put_slice(data);
        Ok(())
    }

    pub fn write_str(&mut self, value: &str) -> Result<()> {
        self.write_bytes(value.as_bytes())
    }

    pub fn write_raw(&mut self, data: &[u8]) {
        self.buffer.put_slice(data);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    pub fn finish(self) -> Bytes {
        self.buffer.freeze()
    }
}

impl Default for ByteWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Little-endian reader over a borrowed payload. Reads past the end fail
/// with [`StateError::UnexpectedEnd`] and leave the cursor untouched.
pub struct ByteReader<'a> {
    buffer: &'a [u8],
}

impl<'a> ByteReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer }
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if self.buffer.remaining() < needed {
            return Err(StateError::UnexpectedEnd {
                needed,
                remaining: self.buffer.remaining(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.buffer.get_u8())
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        Ok(self.buffer.get_u16_le())
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.buffer.get_u32_le())
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.ensure(8)?;
        Ok(self.buffer.get_u64_le())
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.ensure(4)?;
        Ok(self.buffer.get_f32_le())
    }

    /// Reads a 2-byte length prefix followed by that many bytes.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
        self.ensure(2)?;
        let len = u16::from_le_bytes([self.buffer[0], self.buffer[1]]) as usize;
        self.ensure(2 + len)?;

        self.buffer.advance(2);
        let data = self.buffer[..len].to_vec();
        self.buffer.advance(len);
        Ok(data)
    }

    pub fn remaining(&self) -> usize {
        self.buffer.remaining()
    }

    pub fn rest(&self) -> &'a [u8] {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_roundtrip() {
        let mut writer = ByteWriter::new();
        writer.write_u8(7);
        writer.write_u16(0xBEEF);
        writer.write_u32(0xDEAD_BEEF);
        writer.write_u64(u64::MAX - 1);
        writer.write_f32(-2.5);

        let data = writer.finish();
        assert_eq!(data.len(), 1 + 2 + 4 + 8 + 4);

        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.read_u8().unwrap(), 7);
        assert_eq!(reader.read_u16().unwrap(), 0xBEEF);
        assert_eq!(reader.read_u32().unwrap(), 0xDEAD_BEEF);
        assert_eq!(reader.read_u64().unwrap(), u64::MAX - 1);
        assert_eq!(reader.read_f32().unwrap(), -2.5);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_little_endian_layout() {
        let mut writer = ByteWriter::new();
        writer.write_u32(1);
        writer.write_str("ab").unwrap();

        assert_eq!(writer.as_slice(), &[1, 0, 0, 0, 2, 0, b'a', b'b']);
    }

    #[test]
    fn test_prefixed_bytes() {
        let mut writer = ByteWriter::new();
        writer.write_bytes(b"hello").unwrap();
        writer.write_bytes(&[]).unwrap();

        let data = writer.finish();
        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.read_bytes().unwrap(), b"hello");
        assert!(reader.read_bytes().unwrap().is_empty());
    }

    #[test]
    fn test_oversized_blob_rejected() {
        let mut writer = ByteWriter::new();
        let blob = vec![0u8; MAX_PREFIXED_LEN + 1];

        assert!(matches!(
            writer.write_bytes(&blob),
            Err(StateError::BlobTooLarge { .. })
        ));
        assert!(writer.is_empty());
    }

    #[test]
    fn test_truncated_reads() {
        let mut reader = ByteReader::new(&[1, 2, 3]);
        assert!(matches!(
            reader.read_u32(),
            Err(StateError::UnexpectedEnd { needed: 4, remaining: 3 })
        ));

        // Declared length longer than the data left.
        let mut reader = ByteReader::new(&[5, 0, b'a']);
        assert!(reader.read_bytes().is_err());
        assert_eq!(reader.remaining(), 3);
    }
}
