//! Terminal collaborators of `argtree`: showing manual pages and reading
//! passwords without echo.

pub mod man;
pub mod passwd;
