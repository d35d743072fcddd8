//! Relational store access and local file materialization for smena.

pub mod attempts;
pub mod checklists;
pub mod db;
pub mod employees;
pub mod files;
pub mod menu;
pub mod motivation;
pub mod quizzes;
pub mod training;

pub const CRATE_NAME: &str = "smena-storage";

pub use db::{connect, connect_memory};
pub use files::{FetchError, FileFetcher, FileStore, MaterializeOutcome};
