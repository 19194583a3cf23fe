// Library root: the draft rules engine and its wire protocol, independent of
// any transport so the server and tests drive the same code.

pub mod draft;
pub mod error;
pub mod protocol;
