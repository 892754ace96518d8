pub const DNA_BITMASK_A: u8 = 1;
pub const DNA_BITMASK_C: u8 = 2;
pub const DNA_BITMASK_G: u8 = 4;
pub const DNA_BITMASK_T: u8 = 8;
const DNA_BITMASK_N: u8 = DNA_BITMASK_A | DNA_BITMASK_C | DNA_BITMASK_G | DNA_BITMASK_T;

/// A bitmasked IUPAC code for DNA bases, eg DNA_BITMASK_A|DNA_BITMASK_C
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct IupacCode(u8);

impl IupacCode {
    pub const A: Self = Self(DNA_BITMASK_A);
    pub const C: Self = Self(DNA_BITMASK_C);
    pub const G: Self = Self(DNA_BITMASK_G);
    pub const T: Self = Self(DNA_BITMASK_T);
    pub const R: Self = Self(DNA_BITMASK_A | DNA_BITMASK_G);

    pub fn new(bitmask: u8) -> Self {
        Self(bitmask)
    }

    /// Target letters are DNA; `U` is not accepted here.
    #[inline(always)]
    pub fn from_letter(letter: u8) -> Self {
        match letter.to_ascii_uppercase() {
            b'A' => Self(DNA_BITMASK_A),
            b'C' => Self(DNA_BITMASK_C),
            b'G' => Self(DNA_BITMASK_G),
            b'T' => Self(DNA_BITMASK_T),
            b'W' => Self(DNA_BITMASK_A | DNA_BITMASK_T),
            b'S' => Self(DNA_BITMASK_C | DNA_BITMASK_G),
            b'M' => Self(DNA_BITMASK_A | DNA_BITMASK_C),
            b'K' => Self(DNA_BITMASK_G | DNA_BITMASK_T),
            b'R' => Self(DNA_BITMASK_A | DNA_BITMASK_G),
            b'Y' => Self(DNA_BITMASK_C | DNA_BITMASK_T),
            b'B' => Self(DNA_BITMASK_C | DNA_BITMASK_G | DNA_BITMASK_T),
            b'D' => Self(DNA_BITMASK_A | DNA_BITMASK_G | DNA_BITMASK_T),
            b'H' => Self(DNA_BITMASK_A | DNA_BITMASK_C | DNA_BITMASK_T),
            b'V' => Self(DNA_BITMASK_A | DNA_BITMASK_C | DNA_BITMASK_G),
            b'N' => Self(DNA_BITMASK_N),
            _ => Self(0),
        }
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Number of bases this code stands for.
    #[inline(always)]
    pub fn degeneracy(&self) -> u32 {
        self.0.count_ones()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base2iupac() {
        assert!(!IupacCode::from_letter(b'V').is_empty());
        assert_eq!(IupacCode::from_letter(b'A'), IupacCode::A);
        assert_eq!(IupacCode::from_letter(b'c'), IupacCode::C);
        assert_eq!(IupacCode::from_letter(b'R'), IupacCode::R);
        assert_eq!(IupacCode::from_letter(b'U'), IupacCode::new(0));
        assert_eq!(IupacCode::from_letter(b'X'), IupacCode::new(0));
    }

    #[test]
    fn test_degeneracy() {
        assert_eq!(IupacCode::from_letter(b'T').degeneracy(), 1);
        assert_eq!(IupacCode::from_letter(b'Y').degeneracy(), 2);
        assert_eq!(IupacCode::from_letter(b'B').degeneracy(), 3);
        assert_eq!(IupacCode::from_letter(b'N').degeneracy(), 4);
    }
}
