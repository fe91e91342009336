//! Pipeline stages for text-to-quiz generation.
//!
//! Each submodule implements exactly one transformation step.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ chunk ──▶ fallback ──▶ parse ──▶ validate
//! (text)    (3000c)   (provider)   (JSON)    (answers)
//! ```
//!
//! 1. [`input`]: resolve a path, URL or stdin to extracted text and
//!    gate it on a minimum length
//! 2. [`chunk`]: split the text into fixed-size character windows
//! 3. [`fallback`]: per chunk, call the primary provider and fall back to
//!    the secondary on any failure; the only stage with network I/O
//! 4. [`parse`]: recover a list of question records from whatever text
//!    the provider returned
//! 5. [`validate`]: normalise records and check that answers are among
//!    the options

pub mod chunk;
pub mod fallback;
pub mod input;
pub mod parse;
pub mod validate;
