//! Query functions organized by table.

pub mod credentials;
