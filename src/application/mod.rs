pub mod cli;
mod console;
