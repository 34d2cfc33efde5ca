pub(crate) trait BitsExt: Sized {
    fn set(self, shift: u8) -> Self;
    fn clear(self, shift: u8) -> Self;
    fn check(self, shift: u8) -> bool;
    fn set_mask(self, mask: Self) -> Self;
    fn clear_mask(self, mask: Self) -> Self;
}

macro_rules! bits_ext_impl {
    ($($ty:ty),*) => {
        $(
            impl BitsExt for $ty {
                #[inline(always)]
                fn set(self, shift: u8) -> Self {
                    self | (1 << shift)
                }

                #[inline(always)]
                fn clear(self, shift: u8) -> Self {
                    self & !(1 << shift)
                }

                #[inline(always)]
                fn check(self, shift: u8) -> bool {
                    self & (1 << shift) != 0
                }

                #[inline(always)]
                fn set_mask(self, mask: Self) -> Self {
                    self | mask
                }

                #[inline(always)]
                fn clear_mask(self, mask: Self) -> Self {
                    self & !mask
                }
            }
        )*
    };
}

bits_ext_impl!(u8, u16, u32);

/// Lowest set bit position, if any
#[inline(always)]
pub(crate) fn lowest_bit(bits: u16) -> Option<u8> {
    if bits == 0 {
        None
    } else {
        Some(bits.trailing_zeros() as u8)
    }
}
