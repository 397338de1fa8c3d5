//! WebM element IDs used by the muxer.
//!
//! IDs keep their EBML length marker, so the byte width of each ID is part
//! of the value itself (`0x1A45DFA3` is four bytes, `0xA3` is one).

/// Payload type of an element, as declared by the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Master,
    UInt,
    Float,
    String,
    Binary,
}

macro_rules! element_ids {
    ($($name:ident = $id:literal => $kind:ident,)+) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u32)]
        pub enum ElementId {
            $($name = $id,)+
        }

        impl ElementId {
            pub const ALL: &'static [ElementId] = &[$(ElementId::$name,)+];

            pub fn kind(self) -> ElementKind {
                match self {
                    $(ElementId::$name => ElementKind::$kind,)+
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(ElementId::$name => stringify!($name),)+
                }
            }

            pub fn from_u32(value: u32) -> Option<ElementId> {
                match value {
                    $($id => Some(ElementId::$name),)+
                    _ => None,
                }
            }
        }
    };
}

element_ids! {
    Ebml = 0x1A45DFA3 => Master,
    EbmlVersion = 0x4286 => UInt,
    EbmlReadVersion = 0x42F7 => UInt,
    EbmlMaxIdLength = 0x42F2 => UInt,
    EbmlMaxSizeLength = 0x42F3 => UInt,
    DocType = 0x4282 => String,
    DocTypeVersion = 0x4287 => UInt,
    DocTypeReadVersion = 0x4285 => UInt,

    Segment = 0x18538067 => Master,

    Info = 0x1549A966 => Master,
    TimecodeScale = 0x2AD7B1 => UInt,
    Duration = 0x4489 => Float,
    MuxingApp = 0x4D80 => String,
    WritingApp = 0x5741 => String,

    Tracks = 0x1654AE6B => Master,
    TrackEntry = 0xAE => Master,
    TrackNumber = 0xD7 => UInt,
    TrackUid = 0x73C5 => UInt,
    FlagLacing = 0x9C => UInt,
    Language = 0x22B59C => String,
    TrackType = 0x83 => UInt,
    CodecId = 0x86 => String,
    CodecName = 0x258688 => String,
    FlagEnabled = 0xB9 => UInt,
    Video = 0xE0 => Master,
    PixelWidth = 0xB0 => UInt,
    PixelHeight = 0xBA => UInt,

    Cluster = 0x1F43B675 => Master,
    Timecode = 0xE7 => UInt,
    SimpleBlock = 0xA3 => Binary,
}

impl ElementId {
    pub fn value(self) -> u32 {
        self as u32
    }

    /// Encoded width in bytes, read from the length marker in the top byte.
    pub fn width(self) -> u32 {
        id_width(self.value())
    }
}

/// Byte width of a raw ID: the position of the first set bit in its first
/// non-zero byte, as with any vint.
pub fn id_width(id: u32) -> u32 {
    match id {
        0..=0xFF => 1,
        0x100..=0xFFFF => 2,
        0x1_0000..=0xFF_FFFF => 3,
        _ => 4,
    }
}
