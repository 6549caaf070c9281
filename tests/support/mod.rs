#![allow(dead_code)]

pub mod market;
pub mod temp_db;
