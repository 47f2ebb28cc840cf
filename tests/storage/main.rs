#[path = "../common/mod.rs"]
mod common;

mod db;
mod repositories;
