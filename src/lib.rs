#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod cache;
mod cancel;
pub mod dispatch;
mod element;
mod error;
#[cfg(feature = "logging")]
pub mod logging;
mod pool;
pub mod task;
#[cfg(test)]
mod testing;
mod utils;

pub use crate::cache::{ContentCache, MemoryCache, Prefixed, StubCache};
pub use crate::cancel::CancelToken;
pub use crate::dispatch::{Dispatcher, Immediate, Job, UiHandle, UiLoop};
pub use crate::element::{Element, Producer, SlotKind, Tagged};
pub use crate::error::*;
pub use crate::pool::{Pool, PoolBuilder};
pub use crate::task::{
    AbortReason, AsyncTask, LoadedListener, Occupant, Outcome, Task, TaskId, Work,
};
