pub mod challenge;
pub mod quota;

pub use challenge::*;
pub use quota::*;
