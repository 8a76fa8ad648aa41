use byteorder::{ByteOrder, LittleEndian};

/// Bounds-checked reader over an in-memory container
///
/// Every read returns `None` instead of panicking when it would run past the
/// end of the buffer; the position is left unchanged in that case.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    /// Cursor at the start of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Cursor at an arbitrary offset; `None` past the end
    pub fn at(data: &'a [u8], pos: usize) -> Option<Self> {
        (pos <= data.len()).then_some(Self { data, pos })
    }

    /// Current offset
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Borrow the next `len` bytes without advancing
    pub fn peek(&self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        self.data.get(self.pos..end)
    }

    /// Borrow the next `len` bytes and advance past them
    pub fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let bytes = self.peek(len)?;
        self.pos += len;
        Some(bytes)
    }

    /// Read a little-endian u32
    pub fn read_u32_le(&mut self) -> Option<u32> {
        self.take(4).map(LittleEndian::read_u32)
    }

    /// Read a little-endian u64
    pub fn read_u64_le(&mut self) -> Option<u64> {
        self.take(8).map(LittleEndian::read_u64)
    }
}
