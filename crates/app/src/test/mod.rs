//! Test support: throwaway databases and service fixtures.

mod context;
mod db;
mod helpers;

pub(crate) use context::TestContext;
pub(crate) use helpers::*;
