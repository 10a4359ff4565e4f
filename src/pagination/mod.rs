//! Pagination module
//!
//! Supports: Offset (`startAt`/`maxResults`), Cursor (from `links.next`), Single page
//!
//! # Overview
//!
//! Every endpoint's termination logic (is-last flag, total count, empty
//! page, missing next link) collapses into one `Continuation` value. A
//! `Paginator` turns a continuation into the next request and a parsed
//! page's metadata into the following continuation. The continuation plus
//! the original `FetchRequest` is all that is needed to resume.

mod parser;
mod strategies;
mod types;

pub use parser::{extract_path, JsonPageParser, PageParser};
pub use strategies::{
    extract_cursor, CursorLocation, CursorPaginator, OffsetPaginator, SinglePage,
};
pub use types::{Continuation, FetchRequest, Page, PageMeta, Paginator};
