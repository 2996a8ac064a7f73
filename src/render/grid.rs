//! 16×16 register grid.
//!
//! Address `a` sits at row `a / 16`, column `a % 16`; the grid is only a
//! reshaping of the flat snapshot.

use std::{fmt::Write as _, io, time::Duration};

use super::console::{Color, Console};
use crate::protocol::RegisterValue;
use crate::scanner::{ChangeSet, ScanSnapshot, diff};

pub const GRID_SIDE: usize = 16;

/// How cell values are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueFormat {
    #[default]
    Hex,
    Decimal,
}

impl ValueFormat {
    /// `5A` / `90`, as used in read-mode output.
    pub fn value(self, v: u8) -> String {
        match self {
            ValueFormat::Hex => format!("{v:02X}"),
            ValueFormat::Decimal => v.to_string(),
        }
    }
}

pub fn grid_position(address: u8) -> (usize, usize) {
    (address as usize / GRID_SIDE, address as usize % GRID_SIDE)
}

pub fn address_at(row: usize, col: usize) -> u8 {
    (row * GRID_SIDE + col) as u8
}

/// Cell classes, in priority order. A failed cell that differs from the
/// previous scan is still a change; only unchanged failures lose their color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellClass {
    Changed,
    Failed,
    NonZero,
    Zero,
}

impl CellClass {
    pub fn classify(value: RegisterValue, changed: bool) -> Self {
        match value {
            _ if changed => CellClass::Changed,
            RegisterValue::Failed => CellClass::Failed,
            RegisterValue::Read(0) => CellClass::Zero,
            RegisterValue::Read(_) => CellClass::NonZero,
        }
    }

    pub fn color(self) -> Option<Color> {
        match self {
            CellClass::Failed => None,
            CellClass::Changed => Some(Color::Red),
            CellClass::NonZero => Some(Color::Green),
            CellClass::Zero => Some(Color::Gray),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GridRenderer {
    format: ValueFormat,
}

impl GridRenderer {
    pub fn new(format: ValueFormat) -> Self {
        Self { format }
    }

    /// Column header: `     +0 +1 … +F` or `     + 0 + 1 … +15`.
    pub fn header(&self) -> String {
        let mut line = String::from("     ");
        for col in 0..GRID_SIDE {
            let _ = match self.format {
                ValueFormat::Hex => write!(line, "+{col:X} "),
                ValueFormat::Decimal => write!(line, "+{col:2} "),
            };
        }
        line
    }

    /// Cell text without the trailing separator.
    pub fn cell(&self, value: RegisterValue) -> String {
        match (value, self.format) {
            (RegisterValue::Read(v), ValueFormat::Hex) => format!("{v:02X}"),
            (RegisterValue::Read(v), ValueFormat::Decimal) => format!("{v:3}"),
            (RegisterValue::Failed, ValueFormat::Hex) => "??".into(),
            (RegisterValue::Failed, ValueFormat::Decimal) => " ??".into(),
        }
    }

    /// Write the grid. With `previous`, differing cells are classed as
    /// changed; each colored cell restores the console color afterwards.
    pub fn render<C: Console>(
        &self,
        console: &mut C,
        current: &ScanSnapshot,
        previous: Option<&ScanSnapshot>,
    ) -> io::Result<()> {
        let changes = previous.map(|p| diff(p, current));
        self.render_with_changes(console, current, changes.as_ref())
    }

    pub fn render_with_changes<C: Console>(
        &self,
        console: &mut C,
        current: &ScanSnapshot,
        changes: Option<&ChangeSet>,
    ) -> io::Result<()> {
        console.write_str(&self.header())?;
        console.write_str("\n")?;

        for row in 0..GRID_SIDE {
            console.write_str(&format!("{row:X}0:  "))?;
            for col in 0..GRID_SIDE {
                let address = address_at(row, col);
                let value = current.get(address);
                let changed = changes.is_some_and(|c| c.contains(address));
                let text = self.cell(value);

                match CellClass::classify(value, changed).color() {
                    Some(color) => {
                        console.set_color(color)?;
                        console.write_str(&text)?;
                        console.restore_color()?;
                    }
                    None => console.write_str(&text)?,
                }
                console.write_str(" ")?;
            }
            console.write_str("\n")?;
        }
        Ok(())
    }

    /// One-shot dump: banner, grid, trailing blank line.
    pub fn render_dump<C: Console>(&self, console: &mut C, snapshot: &ScanSnapshot) -> io::Result<()> {
        console.write_str("EC Register Dump (16x16 Grid)\n")?;
        console.write_str("Green = Non-zero values, Gray = Zero/Empty, ?? = read failed\n")?;
        console.write_str("=======================================================\n\n")?;
        self.render(console, snapshot, None)?;
        console.write_str("\n")?;
        console.flush()
    }

    /// One monitor refresh: clear, status banner, grid with change colors.
    pub fn render_monitor_frame<C: Console>(
        &self,
        console: &mut C,
        current: &ScanSnapshot,
        previous: &ScanSnapshot,
        interval: Duration,
    ) -> io::Result<()> {
        let changes = diff(previous, current);

        console.clear()?;
        console.write_str(&format!(
            "EC Register Monitor (16x16 grid) - Updates every {} seconds\n",
            interval.as_secs()
        ))?;
        console.write_str("Press Ctrl+C to exit\n")?;
        console.write_str("Red=changed, Green=non-zero unchanged, Gray=zero/empty\n")?;
        console.write_str(&format!(
            "Changes detected: {} | Read time: {}ms\n",
            changes.len(),
            current.elapsed().as_millis()
        ))?;
        console.write_str("=======================================================\n\n")?;
        self.render_with_changes(console, current, Some(&changes))?;
        console.flush()
    }
}
