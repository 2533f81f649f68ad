//! Reexports of stdlib items used across the crate.

pub(crate) use std::cell::Cell;
pub(crate) use std::cmp::Ordering;
pub(crate) use std::collections::VecDeque;
pub(crate) use std::fmt;
pub(crate) use std::fmt::{Debug,Display,Formatter};
pub(crate) use std::fmt::Write as FmtWrite;
pub(crate) use std::mem;
pub(crate) use std::rc::Rc;
pub(crate) use std::str::FromStr;
