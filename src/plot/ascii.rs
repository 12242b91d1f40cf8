//! ASCII plotting of dashboard panels for terminal output.
//!
//! Fixed-size character grid, deterministic output (golden tests below).
//!
//! Plot elements, in drawing order:
//! - post-cut overlay windows: `.` shading, `|` on the cycle-start column
//! - series lines: `*`, `+`, `o`, `#` by position in the panel

use chrono::NaiveDate;

use crate::domain::{MonthlySeries, Panel};
use crate::report::OverlayWindow;
use crate::resample::AlignedSet;

const SERIES_MARKS: [char; 4] = ['*', '+', 'o', '#'];
const SHADE: char = '.';
const START_MARK: char = '|';

/// One series to draw with its own vertical range.
struct Trace<'a> {
    mark: char,
    series: &'a MonthlySeries,
    y_min: f64,
    y_max: f64,
}

/// Render one panel: every series of the panel on the shared timeline, with
/// the overlay windows shaded behind them.
///
/// Panels whose series live on different scales (see [`Panel::shared_axis`])
/// scale each series to the full plot height independently.
pub fn render_panel(
    aligned: &AlignedSet,
    panel: Panel,
    overlays: &[OverlayWindow],
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);
    let months = aligned.timeline().months();

    let (Some(first), Some(last)) = (aligned.timeline().first(), aligned.timeline().last()) else {
        return format!("{}: no data\n", panel.title());
    };

    let plotted: Vec<(char, &MonthlySeries)> = panel
        .series()
        .iter()
        .enumerate()
        .filter_map(|(i, ps)| {
            aligned
                .get(ps.id)
                .filter(|s| !s.has_no_values())
                .map(|s| (SERIES_MARKS[i % SERIES_MARKS.len()], s))
        })
        .collect();

    let shared = value_range(plotted.iter().map(|(_, s)| *s)).map(|(lo, hi)| pad_range(lo, hi, 0.05));
    let traces: Vec<Trace<'_>> = plotted
        .iter()
        .filter_map(|&(mark, series)| {
            let (y_min, y_max) = if panel.shared_axis() {
                shared?
            } else {
                value_range(std::iter::once(series)).map(|(lo, hi)| pad_range(lo, hi, 0.05))?
            };
            Some(Trace { mark, series, y_min, y_max })
        })
        .collect();

    let mut grid = vec![vec![' '; width]; height];
    shade_overlays(&mut grid, months, overlays);
    for trace in &traces {
        draw_series(&mut grid, trace);
    }

    let mut out = String::new();
    let range = match (panel.shared_axis(), shared) {
        (true, Some((lo, hi))) => format!("y=[{lo:.2}, {hi:.2}]"),
        (true, None) => "y=n/a".to_string(),
        (false, _) => "y=per-series".to_string(),
    };
    out.push_str(&format!(
        "{}: {}..{} | {range}\n",
        panel.title(),
        first.format("%Y-%m"),
        last.format("%Y-%m"),
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    for ps in panel.series() {
        match traces.iter().find(|t| t.series.id == ps.id) {
            Some(t) if panel.shared_axis() => {
                out.push_str(&format!("  {} {} ({})\n", t.mark, ps.label, ps.id));
            }
            Some(t) => out.push_str(&format!(
                "  {} {} ({}) [{:.2}, {:.2}]\n",
                t.mark, ps.label, ps.id, t.y_min, t.y_max
            )),
            None => out.push_str(&format!("  - {} ({}): no data\n", ps.label, ps.id)),
        }
    }
    for w in overlays {
        out.push_str(&format!(
            "  {START_MARK} {}: shaded {}..{}\n",
            w.label,
            w.start().format("%Y-%m"),
            w.end.format("%Y-%m"),
        ));
    }

    out
}

fn shade_overlays(grid: &mut [Vec<char>], months: &[NaiveDate], overlays: &[OverlayWindow]) {
    let width = grid[0].len();
    for (i, &month) in months.iter().enumerate() {
        let x = map_x(i, months.len(), width);
        for w in overlays {
            if w.start() == month {
                fill_column(grid, x, START_MARK, |c| c == ' ' || c == SHADE);
            } else if w.contains(month) {
                fill_column(grid, x, SHADE, |c| c == ' ');
            }
        }
    }
}

fn fill_column(grid: &mut [Vec<char>], x: usize, ch: char, replace: impl Fn(char) -> bool) {
    for row in grid.iter_mut() {
        if replace(row[x]) {
            row[x] = ch;
        }
    }
}

fn draw_series(grid: &mut [Vec<char>], trace: &Trace<'_>) {
    let height = grid.len();
    let width = grid[0].len();
    let n = trace.series.points.len();

    let mut prev = None;
    for (i, point) in trace.series.points.iter().enumerate() {
        let Some(v) = point.value else {
            prev = None;
            continue;
        };
        let x = map_x(i, n, width);
        let y = map_y(v, trace.y_min, trace.y_max, height);
        match prev {
            Some((x0, y0)) => draw_line(grid, x0, y0, x, y, trace.mark),
            None => plot_cell(grid, x as isize, y as isize, trace.mark),
        }
        prev = Some((x, y));
    }
}

fn value_range<'a>(series: impl Iterator<Item = &'a MonthlySeries>) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for s in series {
        for v in s.points.iter().filter_map(|p| p.value) {
            min_y = min_y.min(v);
            max_y = max_y.max(v);
        }
    }
    if !(min_y.is_finite() && max_y.is_finite()) {
        return None;
    }
    if max_y > min_y {
        Some((min_y, max_y))
    } else {
        // Flat series: centre it.
        Some((min_y - 1.0, max_y + 1.0))
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(index: usize, count: usize, width: usize) -> usize {
    if count < 2 {
        return 0;
    }
    let u = index as f64 / (count as f64 - 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // Row 0 is the top.
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Series marks only replace background cells, so the first series drawn wins.
fn plot_cell(grid: &mut [Vec<char>], x: isize, y: isize, ch: char) {
    if y < 0 || x < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if let Some(cell) = grid.get_mut(y).and_then(|row| row.get_mut(x))
        && matches!(*cell, ' ' | SHADE | START_MARK)
    {
        *cell = ch;
    }
}

/// Integer line drawing (Bresenham).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let (mut x0, mut y0) = (x0 as isize, y0 as isize);
    let (x1, y1) = (x1 as isize, y1 as isize);

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        plot_cell(grid, x0, y0, ch);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
