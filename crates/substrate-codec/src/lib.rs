// SPDX-License-Identifier: GPL-3.0

#![doc = include_str!("../README.md")]

/// Compact (variable-length) integer encoding.
pub mod compact;
mod de;
mod error;
mod layout;
mod naming;
mod reader;
mod ser;

pub use compact::{Compact, CompactInt};
pub use de::{Decoder, Enum, Keyed, Unkeyed, from_bytes, from_bytes_with};
pub use error::Error;
pub use layout::{Layouts, TypeLayout, VariantLayout};
pub use naming::NamingPolicy;
pub use reader::Reader;
pub use ser::{Encoder, Fields, to_bytes, to_bytes_with};
