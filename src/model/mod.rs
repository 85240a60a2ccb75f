//! Plain data exchanged with the communication layer: lines, orders, tag
//! values and machine states.

pub mod line;
pub mod order;
pub mod state;
pub mod value;

pub use line::*;
pub use order::*;
pub use state::*;
pub use value::*;
