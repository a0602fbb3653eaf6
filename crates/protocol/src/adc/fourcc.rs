//! The three-letter command codes ADC packs into a 24-bit integer.

use std::fmt;

/// A three-letter ADC command code (`SUP`, `INF`, `MSG`, ...).
///
/// Stored as the raw ASCII bytes rather than the packed `uint32_t` the C++
/// reference uses, since Rust has no natural little-endian byte-union for
/// this and the byte form compares and prints just as cheaply.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCc([u8; 3]);

impl FourCc {
    /// Builds a code directly from three ASCII bytes.
    #[must_use]
    pub const fn new(bytes: [u8; 3]) -> Self {
        Self(bytes)
    }

    /// The raw ASCII bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> [u8; 3] {
        self.0
    }

    /// Parses a code out of its 3-character string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() == 3 && bytes.iter().all(u8::is_ascii_uppercase) {
            Some(Self([bytes[0], bytes[1], bytes[2]]))
        } else {
            None
        }
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(std::str::from_utf8(&self.0).unwrap_or("???"))
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCc({self})")
    }
}

macro_rules! commands {
    ($($name:ident => $a:literal $b:literal $c:literal),* $(,)?) => {
        impl FourCc {
            $(
                #[doc = concat!("The `", stringify!($a), stringify!($b), stringify!($c), "` command code.")]
                pub const $name: FourCc = FourCc::new([$a, $b, $c]);
            )*
        }
    };
}

commands! {
    SUP => b'S' b'U' b'P',
    STA => b'S' b'T' b'A',
    INF => b'I' b'N' b'F',
    MSG => b'M' b'S' b'G',
    SCH => b'S' b'C' b'H',
    RES => b'R' b'E' b'S',
    CTM => b'C' b'T' b'M',
    RCM => b'R' b'C' b'M',
    GPA => b'G' b'P' b'A',
    PAS => b'P' b'A' b'S',
    QUI => b'Q' b'U' b'I',
    GET => b'G' b'E' b'T',
    GFI => b'G' b'F' b'I',
    SND => b'S' b'N' b'D',
    SID => b'S' b'I' b'D',
    CMD => b'C' b'M' b'D',
    NAT => b'N' b'A' b'T',
    RNT => b'R' b'N' b'T',
    PSR => b'P' b'S' b'R',
    ZON => b'Z' b'O' b'N',
    ZOF => b'Z' b'O' b'F',
    PBD => b'P' b'B' b'D',
    UBD => b'U' b'B' b'D',
    UBN => b'U' b'B' b'N',
    TCP => b'T' b'C' b'P',
    PMI => b'P' b'M' b'I',
}
