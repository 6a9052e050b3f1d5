pub mod manager;
pub mod protocol;
pub mod session;

pub use manager::LspSessionManager;
pub use protocol::{Diagnostic, DocumentSymbol, HoverInfo, Location, LocationLink, Position, Range};
pub use session::LspSession;
