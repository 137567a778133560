mod common;
mod sync;
