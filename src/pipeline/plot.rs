//! Scatter grids with regression lines for correlated feature pairs

use std::iter::successors;
use std::ops::Range;

use plotters::coord::ranged1d::{AsRangedCoord, ValueFormatter};
use plotters::coord::Shift;
use plotters::prelude::*;

use super::correlation::CorrelationTable;
use super::dataset::{complete_case_pair, present_values, FeatureTable, PairData};
use super::stats::{excess_kurtosis, linear_fit, LineFit};
use crate::error::{CorrelationError, Result};

/// Layout and scaling options for [`plot_correlations`]
#[derive(Debug, Clone)]
pub struct PlotConfig {
    /// Panel grid as (rows, columns)
    pub grid: (usize, usize),
    /// Figure size in pixels
    pub size: (u32, u32),
    pub title: String,
    /// An axis is logarithmic when its feature's excess kurtosis exceeds this
    pub kurtosis_threshold: f64,
    /// Scatter marker radius in pixels
    pub point_size: u32,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            grid: (3, 5),
            size: (1100, 700),
            title: "Feature cross-correlations".to_string(),
            kurtosis_threshold: 40.0,
            point_size: 1,
        }
    }
}

/// Whether an axis should be drawn on a log scale.
///
/// Kurtosis is computed over the feature's finite present values only.
pub fn use_log_scale<T: FeatureTable + ?Sized>(
    dataset: &T,
    feature: &str,
    threshold: f64,
) -> Result<bool> {
    let values = present_values(dataset, feature)?;
    let finite: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    Ok(excess_kurtosis(&finite) > threshold)
}

/// Render one scatter panel per table row and return the figure as SVG.
///
/// Panels fill the grid in row order; rows beyond the grid capacity are
/// not drawn. Each panel shows every row where both features are finite,
/// plus a least-squares line fitted over the pair's complete cases.
pub fn plot_correlations<T: FeatureTable + ?Sized>(
    dataset: &T,
    correlations: &CorrelationTable,
    config: &PlotConfig,
) -> Result<String> {
    let panels = correlations
        .records()
        .take(config.grid.0 * config.grid.1)
        .map(|record| Panel::build(dataset, &record.feature1, &record.feature2, config))
        .collect::<Result<Vec<_>>>()?;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, config.size).into_drawing_area();
        root.fill(&WHITE).map_err(plot_err)?;
        let root = root
            .titled(&config.title, ("sans-serif", 20))
            .map_err(plot_err)?;

        let areas = root.split_evenly(config.grid);
        for (area, panel) in areas.iter().zip(&panels) {
            panel.draw(area, config.point_size)?;
        }

        root.present().map_err(plot_err)?;
    }

    Ok(svg)
}

/// Data and scaling decided for one feature pair
#[derive(Debug, Clone)]
struct Panel {
    x_label: String,
    y_label: String,
    points: Vec<(f64, f64)>,
    fit: Option<LineFit>,
    fit_range: Option<Range<f64>>,
    log_x: bool,
    log_y: bool,
}

impl Panel {
    fn build<T: FeatureTable + ?Sized>(
        dataset: &T,
        feature1: &str,
        feature2: &str,
        config: &PlotConfig,
    ) -> Result<Self> {
        let log_x = use_log_scale(dataset, feature1, config.kurtosis_threshold)?;
        let log_y = use_log_scale(dataset, feature2, config.kurtosis_threshold)?;

        let pair = complete_case_pair(dataset, feature1, feature2)?;
        let points: Vec<(f64, f64)> = pair
            .points()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .filter(|(x, y)| (!log_x || *x > 0.0) && (!log_y || *y > 0.0))
            .collect();

        let finite = PairData {
            x: points.iter().map(|p| p.0).collect(),
            y: points.iter().map(|p| p.1).collect(),
        };
        let fit = linear_fit(&finite.x, &finite.y);

        Ok(Self {
            x_label: feature1.to_string(),
            y_label: feature2.to_string(),
            fit_range: bounds(finite.x.iter().copied()),
            points,
            fit,
            log_x,
            log_y,
        })
    }

    fn draw(&self, area: &DrawingArea<SVGBackend<'_>, Shift>, point_size: u32) -> Result<()> {
        let x_range = padded(bounds(self.points.iter().map(|p| p.0)), self.log_x);
        let y_range = padded(bounds(self.points.iter().map(|p| p.1)), self.log_y);

        match (self.log_x, self.log_y) {
            (false, false) => self.draw_on(area, x_range, y_range, point_size),
            (true, false) => self.draw_on(area, x_range.log_scale(), y_range, point_size),
            (false, true) => self.draw_on(area, x_range, y_range.log_scale(), point_size),
            (true, true) => {
                self.draw_on(area, x_range.log_scale(), y_range.log_scale(), point_size)
            }
        }
    }

    fn draw_on<X, Y>(
        &self,
        area: &DrawingArea<SVGBackend<'_>, Shift>,
        x_range: X,
        y_range: Y,
        point_size: u32,
    ) -> Result<()>
    where
        X: AsRangedCoord<Value = f64>,
        Y: AsRangedCoord<Value = f64>,
        X::CoordDescType: ValueFormatter<f64>,
        Y::CoordDescType: ValueFormatter<f64>,
    {
        let mut chart = ChartBuilder::on(area)
            .margin(5)
            .x_label_area_size(30)
            .y_label_area_size(40)
            .build_cartesian_2d(x_range, y_range)
            .map_err(plot_err)?;

        chart
            .configure_mesh()
            .x_desc(self.x_label.as_str())
            .y_desc(self.y_label.as_str())
            .x_labels(4)
            .y_labels(4)
            .label_style(("sans-serif", 10))
            .max_light_lines(0)
            .draw()
            .map_err(plot_err)?;

        chart
            .draw_series(
                self.points
                    .iter()
                    .map(|&p| Circle::new(p, point_size, BLACK.filled())),
            )
            .map_err(plot_err)?;

        if let (Some(fit), Some(range)) = (self.fit, self.fit_range.clone()) {
            let line = ticks(range, 50, self.log_x)
                .map(|x| (x, fit.predict(x)))
                .filter(|&(_, y)| !self.log_y || y > 0.0);
            chart
                .draw_series(LineSeries::new(line, &RED))
                .map_err(plot_err)?;
        }

        Ok(())
    }
}

fn plot_err<E: std::fmt::Display>(e: E) -> CorrelationError {
    CorrelationError::Plot(e.to_string())
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<Range<f64>> {
    values.fold(None, |acc, v| match acc {
        None => Some(v..v),
        Some(r) => Some(r.start.min(v)..r.end.max(v)),
    })
}

/// Axis range with a small margin; empty or flat data still gets a range.
fn padded(range: Option<Range<f64>>, log: bool) -> Range<f64> {
    let default = if log { 1.0..10.0 } else { 0.0..1.0 };
    let Some(range) = range else {
        return default;
    };

    if log {
        if range.start == range.end {
            return range.start / 2.0..range.end * 2.0;
        }
        return range.start / 1.1..range.end * 1.1;
    }

    let span = range.end - range.start;
    if span == 0.0 {
        let pad = range.start.abs().max(1.0) * 0.5;
        return range.start - pad..range.end + pad;
    }
    range.start - span * 0.05..range.end + span * 0.05
}

/// Evenly spaced sample points across a range, log-spaced for log axes
fn ticks(r: Range<f64>, count: usize, log: bool) -> Box<dyn Iterator<Item = f64>> {
    if log {
        let r_log = r.start.log10()..r.end.log10();
        return Box::new(linear_ticks(r_log, count).map(|x| 10_f64.powf(x)));
    }
    Box::new(linear_ticks(r, count))
}

fn linear_ticks(r: Range<f64>, count: usize) -> impl Iterator<Item = f64> {
    let step = (r.end - r.start) / (count.max(2) - 1) as f64;
    successors(Some(r.start), move |x| Some(x + step)).take(count)
}
