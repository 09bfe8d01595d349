//! Chart image output.
//!
//! [`PngChartRenderer`] draws a [`ChartDocument`] onto an in-memory RGB
//! framebuffer with `embedded-graphics` and encodes it with `png`. Text uses
//! the built-in ISO 8859-2 bitmap fonts, so Polish labels render without
//! any system font.
//!
//! Panels are stacked in rows: the first line panel spans the full width,
//! the remaining line panels share the second row and the table panels the
//! third.

use chrono::Datelike;
use embedded_graphics::mono_font::iso_8859_2::{FONT_10X20, FONT_6X13};
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, Line, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle};
use embedded_graphics::text::{Alignment, Text};
use log::debug;
use std::convert::Infallible;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use super::chart::{ChartDocument, LinePanel, LineStyle, TablePanel};
use super::ChartRenderer;
use crate::error::{ReportError, ReportResult};
use crate::services::layout::DATE_FORMAT;
use crate::services::workbook::format_number;

/// Image width in pixels.
pub const IMAGE_WIDTH: u32 = 1800;

const MARGIN: i32 = 20;
const GAP: i32 = 20;
const OVERVIEW_HEIGHT: u32 = 440;
const PERIOD_HEIGHT: u32 = 340;

const TITLE_HEIGHT: i32 = 36;
const TABLE_ROW_HEIGHT: i32 = 24;
const TABLE_LABEL_WIDTH: i32 = 110;

/// Padding between a line panel's border and its plot area.
const PLOT_PADDING_TOP: i32 = TITLE_HEIGHT + 8;
const PLOT_PADDING_RIGHT: i32 = 24;
const PLOT_PADDING_BOTTOM: i32 = 44;
const PLOT_PADDING_LEFT: i32 = 90;
/// Keeps extreme points off the plot border.
const PLOT_INSET: i32 = 8;

const Y_TICKS: usize = 5;
const SERIES_LINE_WIDTH: u32 = 2;
const MARKER_DIAMETER: u32 = 5;
const DOT_STEP_PX: f64 = 7.0;

const BACKGROUND: Rgb888 = Rgb888::WHITE;
const BORDER: Rgb888 = Rgb888::new(0xbb, 0xbb, 0xbb);
const GRID: Rgb888 = Rgb888::new(0xe4, 0xe4, 0xe4);
const AXIS: Rgb888 = Rgb888::new(0x55, 0x55, 0x55);
const TEXT: Rgb888 = Rgb888::BLACK;
const MUTED_TEXT: Rgb888 = Rgb888::new(0x77, 0x77, 0x77);

/// `#rrggbb` to a pixel color; unparseable input draws black.
pub fn parse_color(hex: &str) -> Rgb888 {
    let value = u32::from_str_radix(hex.trim_start_matches('#'), 16).unwrap_or(0);
    Rgb888::new((value >> 16) as u8, (value >> 8) as u8, value as u8)
}

/// RGB framebuffer that `embedded-graphics` draws into.
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        let mut canvas = Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 3],
        };
        canvas.fill(canvas.bounding_box(), BACKGROUND);
        canvas
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb888> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 3;
        Some(Rgb888::new(self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]))
    }

    /// Raw `RGB8` rows, top to bottom.
    pub fn data(&self) -> &[u8] {
        &self.pixels
    }

    fn draw<T>(&mut self, item: &T)
    where
        T: Drawable<Color = Rgb888>,
    {
        match item.draw(self) {
            Ok(_) => {}
            Err(never) => match never {},
        }
    }

    fn fill(&mut self, area: Rectangle, color: Rgb888) {
        self.draw(&area.into_styled(PrimitiveStyle::with_fill(color)));
    }

    fn frame(&mut self, area: Rectangle, fill: Rgb888, stroke: Rgb888) {
        let style = PrimitiveStyleBuilder::new()
            .fill_color(fill)
            .stroke_color(stroke)
            .stroke_width(1)
            .build();
        self.draw(&area.into_styled(style));
    }

    fn line(&mut self, from: Point, to: Point, color: Rgb888, width: u32) {
        self.draw(&Line::new(from, to).into_styled(PrimitiveStyle::with_stroke(color, width)));
    }

    fn text(&mut self, text: &str, at: Point, style: MonoTextStyle<'_, Rgb888>, alignment: Alignment) {
        self.draw(&Text::with_alignment(text, at, style, alignment));
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 {
                continue;
            }
            let (x, y) = (point.x as u32, point.y as u32);
            if x >= self.width || y >= self.height {
                continue;
            }
            let i = (y as usize * self.width as usize + x as usize) * 3;
            self.pixels[i] = color.r();
            self.pixels[i + 1] = color.g();
            self.pixels[i + 2] = color.b();
        }
        Ok(())
    }
}

fn title_style() -> MonoTextStyle<'static, Rgb888> {
    MonoTextStyle::new(&FONT_10X20, TEXT)
}

fn small_style(color: Rgb888) -> MonoTextStyle<'static, Rgb888> {
    MonoTextStyle::new(&FONT_6X13, color)
}

/// Value range of a panel. Normalization works on halves so that ranges
/// wider than `f64::MAX` stay finite.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ValueBounds {
    min: f64,
    max: f64,
}

impl ValueBounds {
    fn from_values(values: impl Iterator<Item = f64>) -> Option<Self> {
        values.fold(None, |bounds, v| match bounds {
            None => Some(Self { min: v, max: v }),
            Some(b) => Some(Self {
                min: b.min.min(v),
                max: b.max.max(v),
            }),
        })
    }

    /// Position of `value` in `0.0..=1.0`; a flat range maps to the middle.
    fn normalize(&self, value: f64) -> f64 {
        let half_range = self.max / 2.0 - self.min / 2.0;
        if half_range <= 0.0 {
            return 0.5;
        }
        ((value / 2.0 - self.min / 2.0) / half_range).clamp(0.0, 1.0)
    }

    fn lerp(&self, t: f64) -> f64 {
        self.min * (1.0 - t) + self.max * t
    }
}

/// Short axis label: two decimals, scientific notation for large values.
fn tick_label(value: f64) -> String {
    if value.abs() >= 1e6 {
        format!("{:.2e}", value)
    } else {
        format_number(value)
    }
}

/// Maps dates and values of one line panel into its plot area.
struct PlotArea {
    area: Rectangle,
    first_day: i64,
    day_span: i64,
    values: ValueBounds,
}

impl PlotArea {
    fn inner(&self) -> Rectangle {
        Rectangle::new(
            self.area.top_left + Point::new(PLOT_INSET, PLOT_INSET),
            Size::new(
                self.area.size.width.saturating_sub(2 * PLOT_INSET as u32),
                self.area.size.height.saturating_sub(2 * PLOT_INSET as u32),
            ),
        )
    }

    fn to_screen(&self, day: i64, value: f64) -> Point {
        let inner = self.inner();
        let x_norm = if self.day_span == 0 {
            0.5
        } else {
            (day - self.first_day) as f64 / self.day_span as f64
        };
        let y_norm = self.values.normalize(value);
        Point::new(
            inner.top_left.x + (x_norm * inner.size.width as f64).round() as i32,
            inner.top_left.y + ((1.0 - y_norm) * inner.size.height as f64).round() as i32,
        )
    }

    fn y_for(&self, t: f64) -> i32 {
        let inner = self.inner();
        inner.top_left.y + ((1.0 - t) * inner.size.height as f64).round() as i32
    }
}

fn dotted_segment(canvas: &mut Canvas, from: Point, to: Point, color: Rgb888) {
    let (dx, dy) = ((to.x - from.x) as f64, (to.y - from.y) as f64);
    let length = (dx * dx + dy * dy).sqrt();
    let steps = (length / DOT_STEP_PX).floor() as i32;
    for step in 0..=steps {
        let t = if steps == 0 { 0.0 } else { step as f64 / steps as f64 };
        let center = Point::new(
            from.x + (dx * t).round() as i32,
            from.y + (dy * t).round() as i32,
        );
        canvas.draw(
            &Circle::with_center(center, SERIES_LINE_WIDTH + 1).into_styled(PrimitiveStyle::with_fill(color)),
        );
    }
}

fn draw_panel_frame(canvas: &mut Canvas, area: Rectangle, title: &str) {
    canvas.frame(area, BACKGROUND, BORDER);
    let center_x = area.top_left.x + area.size.width as i32 / 2;
    canvas.text(
        title,
        Point::new(center_x, area.top_left.y + TITLE_HEIGHT - 10),
        title_style(),
        Alignment::Center,
    );
}

fn draw_placeholder(canvas: &mut Canvas, area: Rectangle, text: &str) {
    canvas.text(
        text,
        area.center(),
        small_style(MUTED_TEXT),
        Alignment::Center,
    );
}

fn draw_line_panel(canvas: &mut Canvas, panel: &LinePanel, area: Rectangle) {
    draw_panel_frame(canvas, area, &panel.title);

    let plot = Rectangle::new(
        area.top_left + Point::new(PLOT_PADDING_LEFT, PLOT_PADDING_TOP),
        Size::new(
            area.size.width.saturating_sub((PLOT_PADDING_LEFT + PLOT_PADDING_RIGHT) as u32),
            area.size.height.saturating_sub((PLOT_PADDING_TOP + PLOT_PADDING_BOTTOM) as u32),
        ),
    );

    let points = || panel.series.iter().flat_map(|s| s.points.iter());
    let day = |date: &chrono::NaiveDate| date.num_days_from_ce() as i64;
    let first_day = points().map(|(date, _)| day(date)).min();
    let last_day = points().map(|(date, _)| day(date)).max();
    let (Some(first_day), Some(last_day)) = (first_day, last_day) else {
        let text = panel.placeholder.as_deref().unwrap_or_default();
        draw_placeholder(canvas, plot, text);
        return;
    };
    let Some(values) = ValueBounds::from_values(points().map(|(_, v)| *v)) else {
        return;
    };
    let mapping = PlotArea {
        area: plot,
        first_day,
        day_span: last_day - first_day,
        values,
    };

    // grid and y ticks
    let right = plot.top_left.x + plot.size.width as i32;
    for tick in 0..Y_TICKS {
        let t = tick as f64 / (Y_TICKS - 1) as f64;
        let y = mapping.y_for(t);
        canvas.line(Point::new(plot.top_left.x, y), Point::new(right, y), GRID, 1);
        canvas.text(
            &tick_label(values.lerp(t)),
            Point::new(plot.top_left.x - 6, y + 4),
            small_style(AXIS),
            Alignment::Right,
        );
    }

    // axes
    let bottom = plot.top_left.y + plot.size.height as i32;
    canvas.line(Point::new(plot.top_left.x, plot.top_left.y), Point::new(plot.top_left.x, bottom), AXIS, 1);
    canvas.line(Point::new(plot.top_left.x, bottom), Point::new(right, bottom), AXIS, 1);

    // first and last date under the axis, axis names
    let first_date = panel.series.iter().flat_map(|s| s.points.first()).map(|(d, _)| *d).min();
    let last_date = panel.series.iter().flat_map(|s| s.points.last()).map(|(d, _)| *d).max();
    if let Some(date) = first_date {
        let label = date.format(DATE_FORMAT).to_string();
        canvas.text(&label, Point::new(plot.top_left.x, bottom + 16), small_style(AXIS), Alignment::Left);
    }
    if let Some(date) = last_date.filter(|d| Some(*d) != first_date) {
        let label = date.format(DATE_FORMAT).to_string();
        canvas.text(&label, Point::new(right, bottom + 16), small_style(AXIS), Alignment::Right);
    }
    let center_x = plot.top_left.x + plot.size.width as i32 / 2;
    canvas.text(&panel.x_label, Point::new(center_x, bottom + 34), small_style(TEXT), Alignment::Center);
    canvas.text(
        &panel.y_label,
        Point::new(area.top_left.x + 8, plot.top_left.y - 6),
        small_style(TEXT),
        Alignment::Left,
    );

    for series in &panel.series {
        let color = parse_color(&series.color);
        let screen: Vec<Point> = series
            .points
            .iter()
            .map(|(date, value)| mapping.to_screen(day(date), *value))
            .collect();
        for pair in screen.windows(2) {
            match series.style {
                LineStyle::Solid => canvas.line(pair[0], pair[1], color, SERIES_LINE_WIDTH),
                LineStyle::Dotted => dotted_segment(canvas, pair[0], pair[1], color),
            }
        }
        for point in &screen {
            canvas.draw(
                &Circle::with_center(*point, MARKER_DIAMETER).into_styled(PrimitiveStyle::with_fill(color)),
            );
        }
    }

    // legend, top right of the plot
    let legend_x = right - 150;
    for (i, series) in panel.series.iter().enumerate() {
        let y = plot.top_left.y + 12 + i as i32 * 16;
        let color = parse_color(&series.color);
        let (from, to) = (Point::new(legend_x, y), Point::new(legend_x + 24, y));
        match series.style {
            LineStyle::Solid => canvas.line(from, to, color, SERIES_LINE_WIDTH),
            LineStyle::Dotted => dotted_segment(canvas, from, to, color),
        }
        canvas.text(&series.name, Point::new(legend_x + 30, y + 4), small_style(TEXT), Alignment::Left);
    }
}

fn table_height(panel: &TablePanel) -> u32 {
    let body_rows = panel.rows.len().max(1) as i32;
    (TITLE_HEIGHT + TABLE_ROW_HEIGHT * (1 + body_rows) + 12) as u32
}

fn draw_table_panel(canvas: &mut Canvas, panel: &TablePanel, area: Rectangle) {
    draw_panel_frame(canvas, area, &panel.title);

    let left = area.top_left.x + 8;
    let width = area.size.width as i32 - 16;
    let header_top = area.top_left.y + TITLE_HEIGHT;
    let column_width = (width - TABLE_LABEL_WIDTH) / panel.columns.len().max(1) as i32;

    canvas.fill(
        Rectangle::new(Point::new(left, header_top), Size::new(width as u32, TABLE_ROW_HEIGHT as u32)),
        parse_color(&panel.header_color),
    );
    let baseline = |top: i32| top + TABLE_ROW_HEIGHT - 8;
    for (c, column) in panel.columns.iter().enumerate() {
        let x = left + TABLE_LABEL_WIDTH + column_width * (c as i32 + 1) - 6;
        canvas.text(column, Point::new(x, baseline(header_top)), small_style(Rgb888::WHITE), Alignment::Right);
    }

    let body_top = header_top + TABLE_ROW_HEIGHT;
    if panel.rows.is_empty() {
        let text = panel.placeholder.as_deref().unwrap_or_default();
        canvas.text(
            text,
            Point::new(left + width / 2, baseline(body_top)),
            small_style(MUTED_TEXT),
            Alignment::Center,
        );
        return;
    }

    for (r, (label, cells)) in panel.rows.iter().enumerate() {
        let top = body_top + r as i32 * TABLE_ROW_HEIGHT;
        if r % 2 == 1 {
            canvas.fill(
                Rectangle::new(Point::new(left, top), Size::new(width as u32, TABLE_ROW_HEIGHT as u32)),
                GRID,
            );
        }
        canvas.text(label, Point::new(left + 6, baseline(top)), small_style(TEXT), Alignment::Left);
        for (c, cell) in cells.iter().enumerate() {
            let x = left + TABLE_LABEL_WIDTH + column_width * (c as i32 + 1) - 6;
            canvas.text(cell, Point::new(x, baseline(top)), small_style(TEXT), Alignment::Right);
        }
    }
}

/// Splits `width` into `count` equal columns separated by [`GAP`].
fn row_cells(top: i32, width: u32, height: u32, count: usize) -> Vec<Rectangle> {
    if count == 0 {
        return Vec::new();
    }
    let gaps = GAP as u32 * (count as u32 - 1);
    let cell_width = width.saturating_sub(gaps) / count as u32;
    (0..count)
        .map(|i| {
            let x = MARGIN + i as i32 * (cell_width as i32 + GAP);
            Rectangle::new(Point::new(x, top), Size::new(cell_width, height))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Lines,
    Tables,
}

/// Draw the whole document onto a fresh canvas.
pub fn draw_document(document: &ChartDocument) -> Canvas {
    let lines: Vec<&LinePanel> = document.line_panels().collect();
    let tables: Vec<&TablePanel> = document.table_panels().collect();
    let content_width = IMAGE_WIDTH - 2 * MARGIN as u32;
    let table_row_height = tables.iter().map(|t| table_height(t)).max().unwrap_or(0);

    let mut rows: Vec<(RowKind, u32, usize)> = Vec::new();
    if !lines.is_empty() {
        rows.push((RowKind::Lines, OVERVIEW_HEIGHT, 1));
    }
    if lines.len() > 1 {
        rows.push((RowKind::Lines, PERIOD_HEIGHT, lines.len() - 1));
    }
    if !tables.is_empty() {
        rows.push((RowKind::Tables, table_row_height, tables.len()));
    }
    let content_height: u32 = rows.iter().map(|(_, h, _)| h).sum::<u32>()
        + GAP as u32 * rows.len().saturating_sub(1) as u32;
    let mut canvas = Canvas::new(IMAGE_WIDTH, content_height + 2 * MARGIN as u32);

    let mut top = MARGIN;
    let mut line_panels = lines.into_iter();
    let mut table_panels = tables.into_iter();
    for (kind, height, count) in rows {
        for cell in row_cells(top, content_width, height, count) {
            match kind {
                RowKind::Lines => {
                    if let Some(panel) = line_panels.next() {
                        draw_line_panel(&mut canvas, panel, cell);
                    }
                }
                RowKind::Tables => {
                    if let Some(panel) = table_panels.next() {
                        draw_table_panel(&mut canvas, panel, cell);
                    }
                }
            }
        }
        top += height as i32 + GAP;
    }
    canvas
}

fn encode(canvas: &Canvas, path: &Path) -> Result<(), String> {
    let file = File::create(path).map_err(|e| e.to_string())?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), canvas.width, canvas.height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header().map_err(|e| e.to_string())?;
    writer.write_image_data(canvas.data()).map_err(|e| e.to_string())?;
    writer.finish().map_err(|e| e.to_string())
}

/// Renders the report image as PNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngChartRenderer;

impl PngChartRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl ChartRenderer for PngChartRenderer {
    fn render(&self, document: &ChartDocument, path: &Path) -> ReportResult<()> {
        let canvas = draw_document(document);
        debug!(
            "Chart image {}x{} with {} panels",
            canvas.width,
            canvas.height,
            document.panels.len()
        );
        encode(&canvas, path)
            .map_err(|e| ReportError::Render(format!("failed to write {}: {}", path.display(), e)))
    }
}
