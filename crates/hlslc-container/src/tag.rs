use core::fmt;

/// A four-character code identifying a container or chunk.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// Container magic.
    pub const DXBC: FourCC = FourCC(*b"DXBC");
    /// Resource definitions.
    pub const RDEF: FourCC = FourCC(*b"RDEF");
    /// Input signature.
    pub const ISGN: FourCC = FourCC(*b"ISGN");
    /// Output signature.
    pub const OSGN: FourCC = FourCC(*b"OSGN");
    /// Shader model 4 bytecode.
    pub const SHDR: FourCC = FourCC(*b"SHDR");
    /// Shader model 5 bytecode.
    pub const SHEX: FourCC = FourCC(*b"SHEX");
    /// Statistics.
    pub const STAT: FourCC = FourCC(*b"STAT");

    /// Build a tag from its little-endian `u32` encoding.
    #[inline]
    pub const fn from_u32_le(value: u32) -> Self {
        FourCC(value.to_le_bytes())
    }

    /// The little-endian `u32` encoding used on the wire.
    #[inline]
    pub const fn to_u32_le(self) -> u32 {
        u32::from_le_bytes(self.0)
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC({self})")
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

impl From<[u8; 4]> for FourCC {
    fn from(bytes: [u8; 4]) -> Self {
        FourCC(bytes)
    }
}
