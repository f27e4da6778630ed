//! Per-participant colors.
//!
//! Every device derives the same color for a session on its own, so no color is ever
//! exchanged over the wire.
use crate::session_id::SessionId;
use crate::util;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
    Magenta,
    Cyan,
    Purple,
    Orange,
    Brown,
    LightGray,
    Gray,
    DarkGray,
    Black,
    White,
}

pub const PALETTE: [Color; 14] = [
    Color::Red,
    Color::Green,
    Color::Blue,
    Color::Yellow,
    Color::Magenta,
    Color::Cyan,
    Color::Purple,
    Color::Orange,
    Color::Brown,
    Color::LightGray,
    Color::Gray,
    Color::DarkGray,
    Color::Black,
    Color::White,
];

impl Color {
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            Color::Red => (255, 0, 0),
            Color::Green => (0, 255, 0),
            Color::Blue => (0, 0, 255),
            Color::Yellow => (255, 255, 0),
            Color::Magenta => (255, 0, 255),
            Color::Cyan => (0, 255, 255),
            Color::Purple => (128, 0, 128),
            Color::Orange => (255, 128, 0),
            Color::Brown => (153, 102, 51),
            Color::LightGray => (170, 170, 170),
            Color::Gray => (128, 128, 128),
            Color::DarkGray => (85, 85, 85),
            Color::Black => (0, 0, 0),
            Color::White => (255, 255, 255),
        }
    }
}

/// Palette entry for a session.
///
/// UUID sessions use their first four bytes as a little-endian word; other identifiers
/// use the first four bytes of their blake2b digest.
pub fn color_for(session_id: &SessionId) -> Color {
    let seed = match session_id.to_uuid() {
        Some(uuid) => util::leading_u32(uuid.as_bytes()),
        None => util::leading_u32(&util::hash(session_id.as_str().as_bytes())),
    };
    PALETTE[seed as usize % PALETTE.len()]
}
