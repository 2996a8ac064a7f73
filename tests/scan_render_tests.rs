//! Full-table scans rendered as text grids.
//!
//! Covers the dump path and a single monitor cycle end to end, with color
//! escapes both on and off.

mod common;

use std::time::Duration;

use ecreader::Session;
use ecreader::error::EcError;
use ecreader::render::{AnsiConsole, GridRenderer, ValueFormat};
use ecreader::scanner::{MonitorInterval, StopSignal, diff, run_monitor, scan_all};

use common::{device, reader};

fn plain(console: AnsiConsole<Vec<u8>>) -> String {
    String::from_utf8(console.into_inner()).unwrap()
}

#[test]
fn dump_lays_out_sixteen_rows() {
    let ec = device(&[(0x00, 0x01), (0x3F, 0xAB), (0xFF, 0x10)]);
    let session = Session::new();
    session.suppress_always();
    let mut proto = reader(&ec, &session);

    let snapshot = scan_all(&mut proto);
    let mut console = AnsiConsole::new(Vec::new(), false);
    GridRenderer::new(ValueFormat::Hex).render_dump(&mut console, &snapshot).unwrap();
    let out = plain(console);

    assert!(out.starts_with("EC Register Dump (16x16 Grid)\n"));
    let rows: Vec<&str> = out.lines().filter(|l| l.get(2..5) == Some(":  ")).collect();
    assert_eq!(rows.len(), 16);
    assert!(rows[0].starts_with("00:  01 00 00"));
    assert!(rows[3].ends_with("AB "));
    assert!(rows[15].starts_with("F0:  "));
    assert!(rows[15].ends_with("10 "));
    assert_eq!(session.counters().successful_reads(), 256);
}

#[test]
fn dump_marks_failed_cells() {
    let ec = device(&[(0x10, 0x05)]);
    ec.borrow_mut().dead.insert(0x11);
    let session = Session::new();
    session.suppress_always();
    let mut proto = reader(&ec, &session);

    let snapshot = scan_all(&mut proto);
    let mut console = AnsiConsole::new(Vec::new(), false);
    GridRenderer::new(ValueFormat::Decimal).render_dump(&mut console, &snapshot).unwrap();
    let out = plain(console);

    assert_eq!(snapshot.failures(), 1);
    let row = out.lines().find(|l| l.starts_with("10:  ")).unwrap();
    assert!(row.starts_with("10:    5  ??   0 "));
    assert_eq!(session.counters().failed_reads(), 1);
}

#[test]
fn colored_dump_uses_green_and_gray() {
    let ec = device(&[(0x00, 0x7F)]);
    let session = Session::new();
    session.suppress_always();
    let mut proto = reader(&ec, &session);

    let snapshot = scan_all(&mut proto);
    let mut console = AnsiConsole::new(Vec::new(), true);
    GridRenderer::new(ValueFormat::Hex).render_dump(&mut console, &snapshot).unwrap();
    let out = plain(console);

    assert!(out.contains("\x1b[92m7F\x1b[39m "));
    assert!(out.contains("\x1b[90m00\x1b[39m "));
    assert!(!out.contains("\x1b[91m"));
}

#[test]
fn rescans_report_only_real_changes() {
    let ec = device(&[(0x20, 0x01)]);
    let session = Session::new();
    session.suppress_always();
    let mut proto = reader(&ec, &session);

    let first = scan_all(&mut proto);
    ec.borrow_mut().registers.insert(0x20, 0x02);
    ec.borrow_mut().registers.insert(0x21, 0x09);
    let second = scan_all(&mut proto);

    let changes = diff(&first, &second);
    assert_eq!(changes.iter().collect::<Vec<_>>(), vec![0x20, 0x21]);
}

#[test]
fn single_monitor_cycle_renders_banner() {
    let ec = device(&[(0x05, 0x42)]);
    let session = Session::new();
    session.suppress_always();
    let mut proto = reader(&ec, &session);

    let renderer = GridRenderer::new(ValueFormat::Hex);
    let mut console = AnsiConsole::new(Vec::new(), true);
    let interval = MonitorInterval::from_secs(2).unwrap();
    let cycles =
        run_monitor(&mut proto, &renderer, &mut console, interval, &StopSignal::new(), Some(1)).unwrap();
    let out = plain(console);

    assert_eq!(cycles, 1);
    assert!(out.starts_with("\x1b[2J\x1b[H"));
    assert!(out.contains("Updates every 2 seconds"));
    // against the all-zero baseline only the non-zero register differs
    assert!(out.contains("Changes detected: 1 |"));
    assert!(out.contains("\x1b[91m42\x1b[39m"));
}

#[test]
fn stopped_monitor_never_scans() {
    let ec = device(&[]);
    let session = Session::new();
    let mut proto = reader(&ec, &session);
    let stop = StopSignal::new();
    stop.stop();

    let mut console = AnsiConsole::new(Vec::new(), false);
    let cycles = run_monitor(
        &mut proto,
        &GridRenderer::new(ValueFormat::Hex),
        &mut console,
        MonitorInterval::default(),
        &stop,
        None,
    )
    .unwrap();

    assert_eq!(cycles, 0);
    assert_eq!(ec.borrow().executes, 0);
    assert!(plain(console).is_empty());
}

#[test]
fn short_interval_is_rejected_before_scanning() {
    let err = MonitorInterval::from_secs(1).unwrap_err();
    assert!(matches!(err, EcError::InvalidInterval(d) if d == Duration::from_secs(1)));
    assert!(MonitorInterval::new(Duration::from_millis(2000)).is_ok());
}
