mod command;
mod runner;

pub use command::Command;
pub use runner::{OutputMode, render, run, run_demo, run_with_format};
