pub mod init;
pub mod recover;
pub mod replay;

pub use init::{init, InitArgs};
pub use recover::{recover, RecoverArgs};
pub use replay::{replay, ReplayArgs};
