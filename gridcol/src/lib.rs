// Library side of the gridcol command-line tool

pub mod app;
pub mod config;
pub mod io;
