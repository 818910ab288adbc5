//! Match finders for the three effort levels.
//!
//! Each finder writes tokens for the whole window tail into `dst` and returns the number of
//! bytes written, or `None` when the tokens would not fit (the input did not compress).

pub(crate) mod best;
pub(crate) mod better;
pub(crate) mod fast;

pub(crate) use best::encode_best;
pub(crate) use better::encode_better;
pub(crate) use fast::encode_fast;
