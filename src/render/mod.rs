pub mod console;
pub mod grid;

pub use console::{AnsiConsole, Color, Console, stdout_console};
pub use grid::{CellClass, GridRenderer, ValueFormat, address_at, grid_position};
