use std::{
    fmt,
    io::{self, Write},
};

/// A fixed-width instruction operand, stored little-endian.
pub trait Operand: Copy + Default + fmt::Display {
    const WIDTH: usize;

    fn write_le<W: Write>(self, out: &mut W) -> io::Result<()>;

    /// Decode from the front of `bytes`, or `None` if too few remain.
    fn read_le(bytes: &[u8]) -> Option<Self>;
}

macro_rules! impl_operand {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Operand for $ty {
                const WIDTH: usize = size_of::<$ty>();

                #[inline]
                fn write_le<W: Write>(self, out: &mut W) -> io::Result<()> {
                    out.write_all(&self.to_le_bytes())
                }

                #[inline]
                fn read_le(bytes: &[u8]) -> Option<Self> {
                    let raw = bytes.get(..Self::WIDTH)?.try_into().ok()?;
                    Some(<$ty>::from_le_bytes(raw))
                }
            }
        )*
    };
}

impl_operand!(u8, u16, u32, i16, i32);
