//! Query Layer - lookups, cross-reference queries and matrices
//!
//! Every operation takes an explicit `&Session`; there is no ambient
//! current session.

pub mod lookup;
pub mod matrix;
pub mod results;

pub use lookup::{find_segment, find_sensor};
pub use matrix::{crosstalk_matrix, CrosstalkMatrix, MatrixAxis, MatrixCell};
pub use results::{query_results, MethodFilter};
