//! Square planes of modules packed bitwise into bytes.

/// A square grid of booleans (`true` = dark / set), packed row-major.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ModuleGrid {
    size: u8,
    bits: Vec<u8>,
}

impl ModuleGrid {
    /// Creates an all-light grid `size` modules wide.
    pub fn new(size: u8) -> Self {
        let count = usize::from(size) * usize::from(size);
        Self {
            size,
            bits: vec![0u8; (count + 7) / 8],
        }
    }

    pub fn size(&self) -> u8 {
        self.size
    }

    /// Returns the module at `(x, y)`, or `false` outside the grid.
    pub fn get(&self, x: i32, y: i32) -> bool {
        let range = 0..i32::from(self.size);
        range.contains(&x) && range.contains(&y) && self.get_bounded(x as u8, y as u8)
    }

    pub fn get_bounded(&self, x: u8, y: u8) -> bool {
        let (byteindex, bitindex) = self.index(x, y);
        (self.bits[byteindex] >> bitindex) & 1 != 0
    }

    /// Sets the module at `(x, y)`; coordinates outside the grid are ignored.
    pub fn set_unbounded(&mut self, x: i32, y: i32, isdark: bool) {
        let range = 0..i32::from(self.size);
        if range.contains(&x) && range.contains(&y) {
            self.set_bounded(x as u8, y as u8, isdark);
        }
    }

    pub fn set_bounded(&mut self, x: u8, y: u8, isdark: bool) {
        let (byteindex, bitindex) = self.index(x, y);
        if isdark {
            self.bits[byteindex] |= 1u8 << bitindex;
        } else {
            self.bits[byteindex] &= !(1u8 << bitindex);
        }
    }

    pub fn toggle(&mut self, x: u8, y: u8) {
        let (byteindex, bitindex) = self.index(x, y);
        self.bits[byteindex] ^= 1u8 << bitindex;
    }

    pub fn fill_rectangle(&mut self, left: u8, top: u8, width: u8, height: u8) {
        for dy in 0..height {
            for dx in 0..width {
                self.set_bounded(left + dx, top + dy, true);
            }
        }
    }

    /// Number of set modules.
    pub fn count_dark(&self) -> usize {
        // Padding bits in the last byte are never set.
        self.bits
            .iter()
            .map(|x| x.count_ones() as usize)
            .sum()
    }

    fn index(&self, x: u8, y: u8) -> (usize, u8) {
        let range = 0..self.size;
        assert!(range.contains(&x) && range.contains(&y), "Module coordinates out of range");
        let index = usize::from(y) * usize::from(self.size) + usize::from(x);
        (index >> 3, (index & 7) as u8)
    }
}
