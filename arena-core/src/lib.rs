#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_debug_implementations, missing_docs, rust_2018_idioms)]
#![deny(unreachable_pub)]

//! arena-core

pub mod common;
pub mod messages;
pub mod otp;
pub mod pagination;
pub mod rejection;
pub mod token;
pub mod validation;
