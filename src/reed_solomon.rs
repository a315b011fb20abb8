//! Reed–Solomon error correction over GF(2^8/0x11D).

/// Largest supported generator degree (error correction codewords per block).
pub const MAX_DEGREE: usize = 30;

/// Antilog table: `EXP[i] = 0x02^i`, doubled in length so products of two logs
/// index it without a modulo.
static EXP: [u8; 512] = build_exp_table();

/// Log table: `LOG[EXP[i]] = i` for `i` in 0..255. `LOG[0]` is unused.
static LOG: [u8; 256] = build_log_table();

const fn build_exp_table() -> [u8; 512] {
    let mut table = [0u8; 512];
    let mut x: u16 = 1;
    let mut i = 0;
    while i < 512 {
        table[i] = x as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= 0x11d;
        }
        i += 1;
    }
    table
}

const fn build_log_table() -> [u8; 256] {
    let exp = build_exp_table();
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 255 {
        table[exp[i] as usize] = i as u8;
        i += 1;
    }
    table
}

/// Returns the product of two field elements.
pub fn multiply(x: u8, y: u8) -> u8 {
    if x == 0 || y == 0 {
        0
    } else {
        EXP[usize::from(LOG[usize::from(x)]) + usize::from(LOG[usize::from(y)])]
    }
}

/// Computes error correction codewords for data blocks with a fixed generator.
#[derive(Clone, Debug)]
pub struct ReedSolomonGenerator {
    divisor: [u8; MAX_DEGREE],
    degree: usize,
}

impl ReedSolomonGenerator {
    /// Builds the generator polynomial of the given degree.
    ///
    /// # Panics
    ///
    /// Panics if `degree` is outside 1..=30.
    pub fn new(degree: usize) -> Self {
        let mut result = Self {
            divisor: [0u8; MAX_DEGREE],
            degree,
        };
        assert!((1..=MAX_DEGREE).contains(&degree), "Degree out of range");
        let divisor: &mut [u8] = &mut result.divisor[..degree];
        // Coefficients from highest to lowest power, leading 1 omitted; starts as x^0.
        divisor[degree - 1] = 1;
        // Multiply by (x - 0x02^i) for i in 0..degree.
        let mut root: u8 = 1;
        for _ in 0..degree {
            for j in 0..degree {
                divisor[j] = multiply(divisor[j], root);
                if j + 1 < degree {
                    divisor[j] ^= divisor[j + 1];
                }
            }
            root = multiply(root, 0x02);
        }
        result
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// The generator coefficients, highest power first, without the leading 1.
    pub fn divisor(&self) -> &[u8] {
        &self.divisor[..self.degree]
    }

    /// Returns the `degree` error correction codewords for `data`.
    pub fn compute_remainder(&self, data: &[u8]) -> Vec<u8> {
        let mut result = vec![0u8; self.degree];
        self.compute_remainder_into(data, &mut result);
        result
    }

    /// Polynomial long division of `data` by the generator, remainder written to `result`.
    pub fn compute_remainder_into(&self, data: &[u8], result: &mut [u8]) {
        assert_eq!(result.len(), self.degree);
        result.fill(0);
        for b in data {
            let factor: u8 = b ^ result[0];
            result.copy_within(1.., 0);
            result[self.degree - 1] = 0;
            for (x, &y) in result.iter_mut().zip(self.divisor().iter()) {
                *x ^= multiply(y, factor);
            }
        }
    }
}

/// Builds the generator polynomial of the given degree; see [`ReedSolomonGenerator::new`].
pub fn compute_divisor(degree: usize) -> Vec<u8> {
    ReedSolomonGenerator::new(degree).divisor().to_vec()
}

/// Returns the error correction codewords of `data` for a divisor from [`compute_divisor`].
pub fn compute_remainder(data: &[u8], divisor: &[u8]) -> Vec<u8> {
    let mut generator = ReedSolomonGenerator {
        divisor: [0u8; MAX_DEGREE],
        degree: divisor.len(),
    };
    assert!((1..=MAX_DEGREE).contains(&divisor.len()), "Degree out of range");
    generator.divisor[..divisor.len()].copy_from_slice(divisor);
    generator.compute_remainder(data)
}
