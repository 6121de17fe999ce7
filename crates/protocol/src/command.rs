//! Command bytes sent by the client at the top of each exchange.

/// A client command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// `'D'`: server streams its source file.
    Download,
    /// `'U'`: client streams a file to the server's sink.
    Upload,
    /// `'Q'`: end of session.
    Quit,
    /// Any other byte. The server ignores it and keeps the session open.
    Unknown(u8),
}

impl Command {
    pub const DOWNLOAD: u8 = b'D';
    pub const UPLOAD: u8 = b'U';
    pub const QUIT: u8 = b'Q';

    pub fn from_byte(byte: u8) -> Self {
        match byte {
            Self::DOWNLOAD => Command::Download,
            Self::UPLOAD => Command::Upload,
            Self::QUIT => Command::Quit,
            other => Command::Unknown(other),
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Command::Download => Self::DOWNLOAD,
            Command::Upload => Self::UPLOAD,
            Command::Quit => Self::QUIT,
            Command::Unknown(b) => b,
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Download => f.write_str("download"),
            Command::Upload => f.write_str("upload"),
            Command::Quit => f.write_str("quit"),
            Command::Unknown(b) => write!(f, "unknown(0x{b:02x})"),
        }
    }
}
