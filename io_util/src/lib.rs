mod read_util;
mod write_util;

pub use self::read_util::*;
pub use self::write_util::*;
