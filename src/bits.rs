//! Bit-level buffers used to assemble segment payloads and data codewords.

/// An appendable sequence of bits, packed MSB-first into bytes.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct BitBuffer {
    data: Vec<u8>,
    length: usize,
}

impl BitBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty buffer with room for `bits` bits.
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            data: Vec::with_capacity((bits + 7) / 8),
            length: 0,
        }
    }

    /// Returns the number of bits appended so far.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Appends the low `len` bits of `val`, most significant bit first.
    ///
    /// # Panics
    ///
    /// Panics if `len > 31` or if `val` does not fit in `len` bits.
    pub fn append_bits(&mut self, val: u32, len: u8) {
        assert!(len <= 31 && (val >> len) == 0, "Value out of range");
        for i in (0..len).rev() {
            let bit: u8 = ((val >> i) as u8) & 1;
            self.push_bit(bit != 0);
        }
    }

    /// Appends every bit of `other`, in order.
    pub fn append_buffer(&mut self, other: &BitBuffer) {
        if self.length % 8 == 0 {
            self.data.truncate(self.length / 8);
            self.data.extend_from_slice(&other.data);
            self.length += other.length;
            return;
        }
        for bit in other.iter() {
            self.push_bit(bit);
        }
    }

    /// Returns the bit at `index`.
    pub fn get(&self, index: usize) -> bool {
        assert!(index < self.length, "Bit index out of range");
        (self.data[index >> 3] >> (7 - (index & 7))) & 1 != 0
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.length).map(move |i| self.get(i))
    }

    /// Finalizes the buffer into bytes, zero-padding the last byte.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Borrows the packed bytes; bits past `len()` in the last byte are zero.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn reader(&self) -> BitReader<'_> {
        BitReader { buffer: self, position: 0 }
    }

    fn push_bit(&mut self, bit: bool) {
        let shift: u8 = 7 - ((self.length as u8) & 7);
        if shift == 7 {
            self.data.push(0);
        }
        if bit {
            let last = self.data.len() - 1;
            self.data[last] |= 1 << shift;
        }
        self.length += 1;
    }
}

impl FromIterator<bool> for BitBuffer {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let mut bb = BitBuffer::new();
        for bit in iter {
            bb.push_bit(bit);
        }
        bb
    }
}

/// Sequential MSB-first reader over a [`BitBuffer`].
pub struct BitReader<'a> {
    buffer: &'a BitBuffer,
    position: usize,
}

impl BitReader<'_> {
    /// Number of bits not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    /// Reads `len` bits as an unsigned value, or `None` if fewer remain.
    pub fn read_bits(&mut self, len: u8) -> Option<u32> {
        assert!(len <= 31);
        if usize::from(len) > self.remaining() {
            return None;
        }
        let mut val: u32 = 0;
        for _ in 0..len {
            val = (val << 1) | u32::from(self.buffer.get(self.position));
            self.position += 1;
        }
        Some(val)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_bits_msb_first() {
        let mut bb = BitBuffer::new();
        bb.append_bits(0b1, 1);
        bb.append_bits(0b0101, 4);
        assert_eq!(bb.len(), 5);
        assert_eq!(bb.into_bytes(), vec![0b1010_1000]);
    }

    #[test]
    fn test_append_across_bytes() {
        let mut bb = BitBuffer::new();
        bb.append_bits(0x1ff, 9);
        bb.append_bits(0, 3);
        bb.append_bits(0xab, 8);
        assert_eq!(bb.len(), 20);
        assert_eq!(bb.as_bytes(), &[0xff, 0x8a, 0xb0]);
    }

    #[test]
    fn test_zero_length_append_is_noop() {
        let mut bb = BitBuffer::new();
        bb.append_bits(0, 0);
        assert!(bb.is_empty());
        assert!(bb.into_bytes().is_empty());
    }

    #[test]
    #[should_panic(expected = "Value out of range")]
    fn test_value_wider_than_length_panics() {
        let mut bb = BitBuffer::new();
        bb.append_bits(8, 3);
    }

    #[test]
    fn test_append_buffer_unaligned() {
        let mut a = BitBuffer::new();
        a.append_bits(0b101, 3);
        let mut b = BitBuffer::new();
        b.append_bits(0b1100_1, 5);
        b.append_bits(0b11, 2);
        a.append_buffer(&b);
        assert_eq!(a.len(), 10);
        assert_eq!(a.iter().collect::<Vec<_>>(), vec![
            true, false, true, true, true, false, false, true, true, true
        ]);
    }

    #[test]
    fn test_append_buffer_aligned() {
        let mut a = BitBuffer::new();
        a.append_bits(0xec, 8);
        let mut b = BitBuffer::new();
        b.append_bits(0b1, 1);
        a.append_buffer(&b);
        a.append_bits(0b1, 1);
        assert_eq!(a.as_bytes(), &[0xec, 0b1100_0000]);
    }

    #[test]
    fn test_reader() {
        let mut bb = BitBuffer::new();
        bb.append_bits(1023, 10);
        bb.append_bits(5, 4);
        let mut r = bb.reader();
        assert_eq!(r.read_bits(10), Some(1023));
        assert_eq!(r.remaining(), 4);
        assert_eq!(r.read_bits(5), None);
        assert_eq!(r.read_bits(4), Some(5));
        assert_eq!(r.remaining(), 0);
    }
}
