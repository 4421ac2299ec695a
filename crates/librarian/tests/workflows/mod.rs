use super::*;

mod analysis;
mod lifecycle;
mod sync;
mod upload;
