/// Foreground color tags stored in the color plane of a [`crate::Canvas`].
///
/// The palette is deliberately tiny: every tag maps to exactly one escape
/// sequence, and [`Color::Reset`] restores the terminal default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Color {
    #[default]
    Reset = 0,
    /// Bright black, rendered as grey by most terminals.
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    White,
}

impl Color {
    /// Every tag in palette order.
    pub const ALL: [Color; 7] = [
        Color::Reset,
        Color::Black,
        Color::Red,
        Color::Green,
        Color::Yellow,
        Color::Blue,
        Color::White,
    ];

    /// The SGR escape sequence selecting this color.
    pub const fn escape_str(self) -> &'static str {
        match self {
            Color::Reset => "\x1b[0m",
            Color::Black => "\x1b[90m",
            Color::Red => "\x1b[91m",
            Color::Green => "\x1b[92m",
            Color::Yellow => "\x1b[93m",
            Color::Blue => "\x1b[94m",
            Color::White => "\x1b[97m",
        }
    }

    pub const fn escape(self) -> &'static [u8] {
        self.escape_str().as_bytes()
    }
}
