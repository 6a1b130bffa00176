//! Candlestick chart rendering.
//!
//! Produces an in-memory PNG with three panels: candlesticks with SMA-20
//! and SMA-50 overlays, volume bars, and an RSI-14 trace with reference
//! lines at 70 and 30. Indicators are computed over the full candle series
//! so that only the displayed window needs to be fully warmed up.

use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use pricewatch_core::{indicators, Candle};
use thiserror::Error;
use tracing::debug;

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;

/// Panel height ratios (price : volume : rsi).
const PRICE_RATIO: u32 = 6;
const VOLUME_RATIO: u32 = 2;
const RSI_RATIO: u32 = 3;

const SMA_SHORT: usize = 20;
const SMA_LONG: usize = 50;
const RSI_PERIOD: usize = 14;

/// Extra candles fetched before the display window so every indicator is
/// warmed up at the first displayed candle.
pub const WARMUP_CANDLES: usize = 50;

/// Hard cap on candles drawn in one chart.
pub const MAX_PLOT_CANDLES: usize = 1000;

const BACKGROUND: RGBColor = RGBColor(22, 26, 37);
const BULL: RGBColor = RGBColor(38, 166, 91);
const BEAR: RGBColor = RGBColor(214, 69, 65);
const SMA_SHORT_COLOR: RGBColor = RGBColor(255, 165, 0);
const SMA_LONG_COLOR: RGBColor = RGBColor(0, 210, 210);
const RSI_COLOR: RGBColor = RGBColor(170, 110, 230);
const GRID: RGBColor = RGBColor(50, 56, 70);

#[derive(Debug, Error)]
pub enum ChartError {
    /// The symbol/interval combination produced no candles to display.
    #[error("no data to display")]
    NoData,

    #[error("failed to render chart: {0}")]
    Render(String),
}

/// Stats over the displayed window, for the message caption.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartSummary {
    pub last_close: f64,
    pub high: f64,
    pub low: f64,
}

/// A rendered chart image plus its caption stats.
pub struct RenderedChart {
    pub png: Vec<u8>,
    pub summary: ChartSummary,
}

/// Render `candles[display_from..]` (capped at [`MAX_PLOT_CANDLES`]) as a
/// PNG. The leading `candles[..display_from]` warm-up feeds the rolling
/// indicators but is never drawn.
pub fn render(candles: &[Candle], display_from: usize) -> Result<RenderedChart, ChartError> {
    let from = display_from.min(candles.len());
    let window = &candles[from..];
    let window = match window.len() {
        0 => return Err(ChartError::NoData),
        n if n > MAX_PLOT_CANDLES => &window[n - MAX_PLOT_CANDLES..],
        _ => window,
    };
    let from = candles.len() - window.len();
    let n = window.len();

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let sma_short = indicators::sma(&closes, SMA_SHORT);
    let sma_long = indicators::sma(&closes, SMA_LONG);
    let rsi = indicators::rsi(&closes, RSI_PERIOD);

    let summary = ChartSummary {
        last_close: window[n - 1].close,
        high: window.iter().map(|c| c.high).fold(f64::MIN, f64::max),
        low: window.iter().map(|c| c.low).fold(f64::MAX, f64::min),
    };

    let mut raw = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut raw, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&BACKGROUND).map_err(to_render_err)?;

        let total_ratio = PRICE_RATIO + VOLUME_RATIO + RSI_RATIO;
        let price_h = HEIGHT * PRICE_RATIO / total_ratio;
        let volume_h = HEIGHT * VOLUME_RATIO / total_ratio;
        let (price_area, rest) = root.split_vertically(price_h as i32);
        let (volume_area, rsi_area) = rest.split_vertically(volume_h as i32);

        draw_price_panel(&price_area, window, from, &sma_short, &sma_long)?;
        draw_volume_panel(&volume_area, window)?;
        draw_rsi_panel(&rsi_area, from, n, &rsi)?;

        root.present().map_err(to_render_err)?;
    }

    let image = image::RgbImage::from_raw(WIDTH, HEIGHT, raw)
        .ok_or_else(|| ChartError::Render("pixel buffer size mismatch".to_string()))?;
    let mut png = Vec::new();
    image::DynamicImage::ImageRgb8(image)
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| ChartError::Render(e.to_string()))?;

    debug!("Rendered chart: {} candles, {} bytes", n, png.len());
    Ok(RenderedChart { png, summary })
}

type Area<'a> = DrawingArea<BitMapBackend<'a>, plotters::coord::Shift>;

fn draw_price_panel(
    area: &Area<'_>,
    window: &[Candle],
    from: usize,
    sma_short: &[Option<f64>],
    sma_long: &[Option<f64>],
) -> Result<(), ChartError> {
    let n = window.len();
    let mut y_min = window.iter().map(|c| c.low).fold(f64::MAX, f64::min);
    let mut y_max = window.iter().map(|c| c.high).fold(f64::MIN, f64::max);
    for series in [sma_short, sma_long] {
        for v in series[from..].iter().flatten() {
            y_min = y_min.min(*v);
            y_max = y_max.max(*v);
        }
    }
    let pad = ((y_max - y_min) * 0.05).max(y_max.abs() * 0.001).max(1e-9);

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), (y_min - pad)..(y_max + pad))
        .map_err(to_render_err)?;

    draw_horizontal_grid(&mut chart, y_min, y_max, n)?;

    let candle_px = candle_width_px(n);
    chart
        .draw_series(window.iter().enumerate().map(|(i, c)| {
            CandleStick::new(
                i as f64,
                c.open,
                c.high,
                c.low,
                c.close,
                BULL.filled(),
                BEAR.filled(),
                candle_px,
            )
        }))
        .map_err(to_render_err)?;

    for (series, color) in [(sma_short, SMA_SHORT_COLOR), (sma_long, SMA_LONG_COLOR)] {
        let points: Vec<(f64, f64)> = series[from..]
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (i as f64, v)))
            .collect();
        if points.len() >= 2 {
            chart
                .draw_series(LineSeries::new(points, color.stroke_width(2)))
                .map_err(to_render_err)?;
        }
    }
    Ok(())
}

fn draw_volume_panel(area: &Area<'_>, window: &[Candle]) -> Result<(), ChartError> {
    let n = window.len();
    let v_max = window
        .iter()
        .map(|c| c.volume)
        .fold(0.0f64, f64::max)
        .max(1e-9);

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0.0..(v_max * 1.05))
        .map_err(to_render_err)?;

    let half_w = 0.35;
    chart
        .draw_series(window.iter().enumerate().map(|(i, c)| {
            let color = if c.is_bullish() { BULL } else { BEAR };
            let x = i as f64;
            Rectangle::new([(x - half_w, 0.0), (x + half_w, c.volume)], color.filled())
        }))
        .map_err(to_render_err)?;
    Ok(())
}

fn draw_rsi_panel(
    area: &Area<'_>,
    from: usize,
    n: usize,
    rsi: &[Option<f64>],
) -> Result<(), ChartError> {
    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0.0..100.0f64)
        .map_err(to_render_err)?;

    // Overbought / oversold reference lines.
    for (level, color) in [(70.0, BEAR), (30.0, BULL)] {
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(-0.5, level), (n as f64 - 0.5, level)],
                color.stroke_width(1),
            )))
            .map_err(to_render_err)?;
    }

    let points: Vec<(f64, f64)> = rsi[from..]
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i as f64, v)))
        .collect();
    if points.len() >= 2 {
        chart
            .draw_series(LineSeries::new(points, RSI_COLOR.stroke_width(2)))
            .map_err(to_render_err)?;
    }
    Ok(())
}

/// A handful of faint horizontal lines in place of a labeled mesh; the
/// bitmap backend carries no font, so the panels stay label-free and the
/// numbers travel in the message caption instead.
fn draw_horizontal_grid(
    chart: &mut ChartContext<'_, BitMapBackend<'_>, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    y_min: f64,
    y_max: f64,
    n: usize,
) -> Result<(), ChartError> {
    let steps = 5;
    let span = y_max - y_min;
    if span <= 0.0 {
        return Ok(());
    }
    for i in 1..steps {
        let y = y_min + span * i as f64 / steps as f64;
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(-0.5, y), (n as f64 - 0.5, y)],
                GRID.stroke_width(1),
            )))
            .map_err(to_render_err)?;
    }
    Ok(())
}

fn candle_width_px(n: usize) -> u32 {
    let per_candle = WIDTH as f64 / n.max(1) as f64;
    ((per_candle * 0.6) as u32).clamp(1, 20)
}

fn to_render_err<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::Render(e.to_string())
}
