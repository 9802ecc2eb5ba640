//! minkit prelude.
//!
//! This module contains the most used types, traits and functions that you
//! can import easily as a group.
//!
//! ```
//! use minkit::prelude::*;
//!
//! ```

#[doc(no_inline)]
pub use crate::error::MinimizerError;

#[doc(no_inline)]
pub use crate::minimize::{MultivariateFn, UnivariateFn};

#[doc(no_inline)]
pub use crate::minimize::bracket::{bracket, bracket_with, Bracket, BracketOptions};
#[doc(no_inline)]
pub use crate::minimize::brent::{refine, refine_with, Brent, RefineOptions, RefineResult};
#[doc(no_inline)]
pub use crate::minimize::linmin::{
    line_minimize, line_minimize_with, LineSearch, LineSearchOptions, LineSearchResult,
};
#[doc(no_inline)]
pub use crate::minimize::powell::{
    minimize as powell_minimize, unit_directions, Powell, PowellOptions, PowellResult,
};
#[doc(no_inline)]
pub use crate::minimize::root::{find_root, find_root_with, RootBracket, RootOptions, RootResult};
