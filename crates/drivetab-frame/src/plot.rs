//! SVG rendering of a numeric column's distribution.
//!
//! The figure has two panels side by side: a histogram with an optional
//! density curve on the left and a horizontal box plot on the right.

use std::fmt::Write;

use drivetab_core::config::AnalysisSettings;
use drivetab_core::text::escape_markup;

use crate::distribution::{BoxStats, Histogram, Kde};

const MARGIN_LEFT: f64 = 56.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 34.0;
const MARGIN_BOTTOM: f64 = 44.0;
const TICKS: usize = 5;

const FILL: &str = "#4c72b0";
const AXIS: &str = "#333333";
const GRID: &str = "#e5e5e5";

/// Figure size and content switches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotOptions {
    /// Total width in pixels.
    pub width: u32,
    /// Total height in pixels.
    pub height: u32,
    /// Overlay a density curve on the histogram.
    pub kde: bool,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 400,
            kde: true,
        }
    }
}

impl From<&AnalysisSettings> for PlotOptions {
    fn from(settings: &AnalysisSettings) -> Self {
        Self {
            width: settings.plot_width,
            height: settings.plot_height,
            kde: settings.kde,
        }
    }
}

/// Plot area of one panel in figure coordinates.
#[derive(Debug, Clone, Copy)]
struct Area {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

/// Linear map from data values to pixels.
#[derive(Debug, Clone, Copy)]
struct Scale {
    d0: f64,
    d1: f64,
    p0: f64,
    p1: f64,
}

impl Scale {
    fn new(d0: f64, d1: f64, p0: f64, p1: f64) -> Self {
        let (d0, d1) = if d1 > d0 { (d0, d1) } else { (d0 - 0.5, d0 + 0.5) };
        Self { d0, d1, p0, p1 }
    }

    fn map(&self, v: f64) -> f64 {
        self.p0 + (v - self.d0) / (self.d1 - self.d0) * (self.p1 - self.p0)
    }

    fn ticks(&self) -> impl Iterator<Item = f64> + '_ {
        let step = (self.d1 - self.d0) / (TICKS - 1) as f64;
        (0..TICKS).map(move |i| self.d0 + step * i as f64)
    }
}

/// Render the distribution of `values` for the column `name`.
///
/// Returns `None` when there are no finite values to draw.
pub fn render_distribution(name: &str, values: &[f64], options: &PlotOptions) -> Option<String> {
    let histogram = Histogram::auto(values)?;
    let stats = BoxStats::from_values(values)?;
    let n: usize = histogram.counts.iter().sum();
    let kde = if options.kde {
        Kde::scott(values, n as f64 * histogram.bin_width())
    } else {
        None
    };

    let width = f64::from(options.width.max(200));
    let height = f64::from(options.height.max(120));
    let panel = width / 2.0;
    let area = |offset: f64| Area {
        x: offset + MARGIN_LEFT,
        y: MARGIN_TOP,
        w: panel - MARGIN_LEFT - MARGIN_RIGHT,
        h: height - MARGIN_TOP - MARGIN_BOTTOM,
    };

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif" font-size="11">"#,
        w = width,
        h = height,
    );
    let _ = writeln!(svg, r#"<rect width="{width}" height="{height}" fill="white"/>"#);
    let _ = writeln!(
        svg,
        r#"<text x="{x}" y="18" text-anchor="middle" font-size="14">{title}</text>"#,
        x = width / 2.0,
        title = escape_markup(&format!("Distribution of {name}")),
    );

    draw_histogram(&mut svg, area(0.0), &histogram, kde.as_ref(), name);
    draw_boxplot(&mut svg, area(panel), &stats, name);

    svg.push_str("</svg>\n");
    Some(svg)
}

fn draw_histogram(
    svg: &mut String,
    area: Area,
    histogram: &Histogram,
    kde: Option<&Kde>,
    name: &str,
) {
    let (first, last) = match (histogram.edges.first(), histogram.edges.last()) {
        (Some(&a), Some(&b)) => (a, b),
        _ => return,
    };
    let top = kde
        .map(Kde::max_y)
        .unwrap_or(0.0)
        .max(histogram.max_count() as f64)
        .max(1.0)
        * 1.05;

    let xs = Scale::new(first, last, area.x, area.x + area.w);
    let ys = Scale::new(0.0, top, area.y + area.h, area.y);

    for tick in ys.ticks() {
        let y = ys.map(tick);
        let _ = writeln!(
            svg,
            r#"<line x1="{x0:.1}" y1="{y:.1}" x2="{x1:.1}" y2="{y:.1}" stroke="{GRID}"/>"#,
            x0 = area.x,
            x1 = area.x + area.w,
        );
        let _ = writeln!(
            svg,
            r#"<text x="{x:.1}" y="{ty:.1}" text-anchor="end">{label}</text>"#,
            x = area.x - 6.0,
            ty = y + 4.0,
            label = tick_label(tick),
        );
    }

    for (i, &count) in histogram.counts.iter().enumerate() {
        let x0 = xs.map(histogram.edges[i]);
        let x1 = xs.map(histogram.edges[i + 1]);
        let y = ys.map(count as f64);
        let _ = writeln!(
            svg,
            r#"<rect x="{x0:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" fill="{FILL}" fill-opacity="0.55" stroke="white" stroke-width="0.5"/>"#,
            w = (x1 - x0).max(0.0),
            h = (area.y + area.h - y).max(0.0),
        );
    }

    if let Some(kde) = kde {
        let points: Vec<String> = kde
            .points
            .iter()
            .map(|&(x, y)| format!("{:.2},{:.2}", xs.map(x), ys.map(y)))
            .collect();
        let _ = writeln!(
            svg,
            r#"<polyline points="{}" fill="none" stroke="{FILL}" stroke-width="2"/>"#,
            points.join(" ")
        );
    }

    draw_x_axis(svg, area, &xs, name);
    let _ = writeln!(
        svg,
        r#"<text transform="translate({x:.1},{y:.1}) rotate(-90)" text-anchor="middle">Count</text>"#,
        x = area.x - 42.0,
        y = area.y + area.h / 2.0,
    );
}

fn draw_boxplot(svg: &mut String, area: Area, stats: &BoxStats, name: &str) {
    let xs = Scale::new(stats.lowest(), stats.highest(), area.x, area.x + area.w);
    let mid = area.y + area.h / 2.0;
    let half = area.h * 0.2;

    let (q1, q3) = (xs.map(stats.q1), xs.map(stats.q3));
    let (lo, hi) = (xs.map(stats.whisker_low), xs.map(stats.whisker_high));
    let median = xs.map(stats.median);

    let _ = writeln!(
        svg,
        r#"<line x1="{lo:.2}" y1="{mid:.2}" x2="{q1:.2}" y2="{mid:.2}" stroke="{AXIS}"/>"#
    );
    let _ = writeln!(
        svg,
        r#"<line x1="{q3:.2}" y1="{mid:.2}" x2="{hi:.2}" y2="{mid:.2}" stroke="{AXIS}"/>"#
    );
    for x in [lo, hi] {
        let _ = writeln!(
            svg,
            r#"<line x1="{x:.2}" y1="{a:.2}" x2="{x:.2}" y2="{b:.2}" stroke="{AXIS}"/>"#,
            a = mid - half / 2.0,
            b = mid + half / 2.0,
        );
    }
    let _ = writeln!(
        svg,
        r#"<rect x="{q1:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" fill="{FILL}" fill-opacity="0.55" stroke="{AXIS}"/>"#,
        y = mid - half,
        w = (q3 - q1).max(0.0),
        h = half * 2.0,
    );
    let _ = writeln!(
        svg,
        r#"<line x1="{median:.2}" y1="{a:.2}" x2="{median:.2}" y2="{b:.2}" stroke="{AXIS}" stroke-width="2"/>"#,
        a = mid - half,
        b = mid + half,
    );
    for &flier in &stats.fliers {
        let _ = writeln!(
            svg,
            r#"<circle cx="{cx:.2}" cy="{mid:.2}" r="3" fill="none" stroke="{AXIS}"/>"#,
            cx = xs.map(flier),
        );
    }

    draw_x_axis(svg, area, &xs, name);
}

fn draw_x_axis(svg: &mut String, area: Area, xs: &Scale, name: &str) {
    let base = area.y + area.h;
    let _ = writeln!(
        svg,
        r#"<line x1="{x0:.1}" y1="{base:.1}" x2="{x1:.1}" y2="{base:.1}" stroke="{AXIS}"/>"#,
        x0 = area.x,
        x1 = area.x + area.w,
    );
    for tick in xs.ticks() {
        let x = xs.map(tick);
        let _ = writeln!(
            svg,
            r#"<line x1="{x:.1}" y1="{base:.1}" x2="{x:.1}" y2="{t:.1}" stroke="{AXIS}"/>"#,
            t = base + 4.0,
        );
        let _ = writeln!(
            svg,
            r#"<text x="{x:.1}" y="{t:.1}" text-anchor="middle">{label}</text>"#,
            t = base + 16.0,
            label = tick_label(tick),
        );
    }
    let _ = writeln!(
        svg,
        r#"<text x="{x:.1}" y="{y:.1}" text-anchor="middle">{label}</text>"#,
        x = area.x + area.w / 2.0,
        y = base + 34.0,
        label = escape_markup(name),
    );
}

/// Axis label with precision chosen by magnitude.
fn tick_label(v: f64) -> String {
    let a = v.abs();
    let s = if a >= 1000.0 || a == 0.0 {
        format!("{v:.0}")
    } else if a >= 10.0 {
        format!("{v:.1}")
    } else {
        format!("{v:.2}")
    };
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}
