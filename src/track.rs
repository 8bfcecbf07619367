//! Tracks: one row of a diagram, holding intervals or continuous signal.
//!
//! Laying out a track computes geometry in data units and never draws:
//! interval tracks produce one six-point outline per interval, graph tracks
//! produce one `(x, y)` series per graph.

use std::fmt;

use crate::interpolate::{impute_zeros, Akima, InterpolateError, MAX_DENSE_SPAN};
use crate::interval::Interval;
use crate::packer::{disjoint_bins_with, Boundary};
use crate::strand::Strand;

/// Fraction of the displayed span used as the base pull-back distance.
pub const PULL_BACK_FRACTION: f64 = 0.005;

/// Color used for intervals and graphs without an explicit color.
pub const DEFAULT_COLOR: &str = "0.2";

/// Stacking priority of the first graph series; each later series adds one.
pub const BASE_Z_ORDER: f64 = 2.7;

/// Result alias for layout operations.
pub type LayoutResult<T> = Result<T, LayoutError>;

/// An error raised while laying out tracks or diagrams.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// The coordinate range of a track without data was requested.
    EmptyTrack,
    /// A diagram has no non-empty track to take its range from.
    EmptyDiagram,
    /// A graph series is malformed.
    InvalidGraph(String),
    /// A graph series could not be interpolated.
    Interpolate(InterpolateError),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::EmptyTrack => f.write_str("track holds no data"),
            LayoutError::EmptyDiagram => f.write_str("diagram has no non-empty track"),
            LayoutError::InvalidGraph(msg) => write!(f, "invalid graph: {msg}"),
            LayoutError::Interpolate(err) => write!(f, "interpolation failed: {err}"),
        }
    }
}

impl std::error::Error for LayoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LayoutError::Interpolate(err) => Some(err),
            _ => None,
        }
    }
}

impl From<InterpolateError> for LayoutError {
    fn from(err: InterpolateError) -> Self {
        LayoutError::Interpolate(err)
    }
}

/// Display settings shared by every kind of track.
///
/// # Example
///
/// ```
/// use genome_browser::TrackOptions;
///
/// let options = TrackOptions::new("Genes").height_ratio(0.4).step(1000);
/// assert_eq!(options.name(), "Genes");
/// assert_eq!(options.step_size(), 1000);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TrackOptions {
    name: String,
    height_ratio: f64,
    step: u64,
    annotate: bool,
    padding: f64,
    alpha: f64,
    pullback: f64,
    resolution: usize,
    boundary: Boundary,
}

impl Default for TrackOptions {
    fn default() -> Self {
        Self {
            name: String::new(),
            height_ratio: 1.0,
            step: 500,
            annotate: true,
            padding: 0.3,
            alpha: 0.9,
            pullback: 1.0,
            resolution: 100_000,
            boundary: Boundary::Inclusive,
        }
    }
}

impl TrackOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Relative height of the track's row in a diagram.
    pub fn height_ratio(mut self, ratio: f64) -> Self {
        self.height_ratio = ratio;
        self
    }

    /// Distance between axis ticks when this track is the bottom row.
    /// Zero is raised to one.
    pub fn step(mut self, step: u64) -> Self {
        self.step = step.max(1);
        self
    }

    /// Whether the track name is shown in the top-left corner of its row.
    pub fn annotate(mut self, annotate: bool) -> Self {
        self.annotate = annotate;
        self
    }

    /// Vertical padding factor below level 0 and between levels.
    pub fn padding(mut self, padding: f64) -> Self {
        self.padding = padding.max(0.0);
        self
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha.clamp(0.0, 1.0);
        self
    }

    /// Multiplier of the pull-back distance of directional intervals.
    pub fn pullback(mut self, pullback: f64) -> Self {
        self.pullback = pullback.max(0.0);
        self
    }

    /// Number of samples used when interpolating graph series.
    pub fn resolution(mut self, resolution: usize) -> Self {
        self.resolution = resolution.max(2);
        self
    }

    pub fn boundary(mut self, boundary: Boundary) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn height(&self) -> f64 {
        self.height_ratio
    }

    pub fn step_size(&self) -> u64 {
        self.step
    }

    pub fn is_annotated(&self) -> bool {
        self.annotate
    }

    pub fn padding_factor(&self) -> f64 {
        self.padding
    }

    pub fn opacity(&self) -> f64 {
        self.alpha
    }

    pub fn pullback_factor(&self) -> f64 {
        self.pullback
    }

    pub fn sample_count(&self) -> usize {
        self.resolution
    }

    pub fn boundary_rule(&self) -> Boundary {
        self.boundary
    }
}

/// Opaque style tag passed through to the renderer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Style {
    pub color: String,
    pub alpha: f64,
}

/// Closed outline of one interval in data units (x) and level units (y).
///
/// Vertices run: start-bottom, start-middle, start-top, end-top, end-middle,
/// end-bottom. The corners on the tapered side are pulled inwards, giving an
/// arrow for directional intervals and a rectangle otherwise.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Polygon {
    pub vertices: [[f64; 2]; 6],
    pub level: usize,
    pub style: Style,
    pub label: Option<String>,
}

/// One resampled signal series.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Series {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub style: Style,
    /// Fill down to zero rather than drawing a line.
    pub fill: bool,
    pub z_order: f64,
}

/// Geometry of one laid-out track.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Geometry {
    Empty,
    Polygons { polygons: Vec<Polygon> },
    Series { series: Vec<Series> },
}

/// Output of laying out a single track.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackLayout {
    pub geometry: Geometry,
    pub xlimits: (f64, f64),
    pub ylimits: (f64, f64),
}

/// A track of discrete intervals packed onto levels.
#[derive(Debug, Clone, Default)]
pub struct IntervalTrack {
    options: TrackOptions,
    intervals: Vec<Interval>,
}

impl IntervalTrack {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_options(TrackOptions::new(name))
    }

    pub fn with_options(options: TrackOptions) -> Self {
        Self {
            options,
            intervals: Vec::new(),
        }
    }

    pub fn options(&self) -> &TrackOptions {
        &self.options
    }

    pub fn add_interval(&mut self, interval: Interval) {
        self.intervals.push(interval);
    }

    /// Intervals in insertion order.
    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Smallest start and largest end over all intervals.
    pub fn xlimits(&self) -> LayoutResult<(f64, f64)> {
        let start = self.intervals.iter().map(Interval::start).min();
        let end = self.intervals.iter().map(Interval::end).max();
        match (start, end) {
            (Some(start), Some(end)) => Ok((start as f64, end as f64)),
            _ => Err(LayoutError::EmptyTrack),
        }
    }

    /// Intervals ordered by packing priority. The sort is stable.
    pub fn sorted(&self) -> Vec<&Interval> {
        let mut sorted: Vec<&Interval> = self.intervals.iter().collect();
        sorted.sort_by_key(|interval| interval.packing_key());
        sorted
    }

    /// Packing levels, parallel to [`IntervalTrack::sorted`].
    pub fn levels(&self) -> Vec<usize> {
        disjoint_bins_with(self.sorted(), self.options.boundary).collect()
    }

    /// Lays the track out against its own coordinate range.
    pub fn layout(&self) -> LayoutResult<TrackLayout> {
        let xlimits = self.xlimits()?;
        self.layout_in(xlimits)
    }

    /// Lays the track out against a displayed range, which scales the
    /// pull-back distance of directional intervals.
    pub fn layout_in(&self, xlimits: (f64, f64)) -> LayoutResult<TrackLayout> {
        if self.is_empty() {
            return Err(LayoutError::EmptyTrack);
        }

        let sorted = self.sorted();
        let levels: Vec<usize> = disjoint_bins_with(&sorted, self.options.boundary).collect();

        let height = 1.0 / (self.options.padding + 1.0);
        let span = (xlimits.1 - xlimits.0).abs();
        let pull_back = self.options.pullback * PULL_BACK_FRACTION * span;

        let polygons = sorted
            .iter()
            .zip(&levels)
            .map(|(interval, &level)| Polygon {
                vertices: outline(interval, level as f64, height, pull_back),
                level,
                style: Style {
                    color: interval
                        .get("color")
                        .map(|color| color.to_string())
                        .unwrap_or_else(|| DEFAULT_COLOR.to_string()),
                    alpha: self.options.alpha,
                },
                label: interval.name().map(str::to_string),
            })
            .collect();

        let top = levels.iter().max().map_or(1.0, |&max| max as f64 + 1.0);
        Ok(TrackLayout {
            geometry: Geometry::Polygons { polygons },
            xlimits,
            ylimits: ((0.0 - self.options.padding) * top / 2.0, top),
        })
    }
}

/// Builds the six-point outline of `interval` at `level`.
fn outline(interval: &Interval, level: f64, height: f64, pull_back: f64) -> [[f64; 2]; 6] {
    let start = interval.start() as f64;
    let width = interval.len() as f64;

    let start_taper = match interval.strand() {
        Strand::Reverse => pull_back.min(width),
        _ => 0.0,
    };
    let end_taper = match interval.strand() {
        Strand::Forward => pull_back.min(width),
        _ => 0.0,
    };

    [
        [start + start_taper, level],
        [start, level + height / 2.0],
        [start + start_taper, level + height],
        [start + width - end_taper, level + height],
        [start + width, level + height / 2.0],
        [start + width - end_taper, level],
    ]
}

/// How a graph series is handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GraphFormat {
    /// Samples as given.
    Raw,
    /// Akima-resampled onto an even grid.
    #[default]
    Interpolate,
}

/// A continuous `(x, y)` signal.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    x: Vec<f64>,
    y: Vec<f64>,
    format: GraphFormat,
    fill: bool,
    color: String,
    alpha: f64,
}

impl Graph {
    /// Creates a graph from paired samples.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> LayoutResult<Self> {
        if x.len() != y.len() {
            return Err(LayoutError::InvalidGraph(format!(
                "x has {} values but y has {}",
                x.len(),
                y.len()
            )));
        }
        if x.is_empty() {
            return Err(LayoutError::InvalidGraph("graph has no samples".into()));
        }
        if x.iter().chain(&y).any(|value| !value.is_finite()) {
            return Err(LayoutError::InvalidGraph("samples must be finite".into()));
        }

        Ok(Self {
            x,
            y,
            format: GraphFormat::default(),
            fill: false,
            color: DEFAULT_COLOR.to_string(),
            alpha: 1.0,
        })
    }

    /// Creates a dense graph from sparse integer positions, with zeros at
    /// positions that have no sample.
    pub fn from_sparse(x: &[u64], y: &[f64]) -> LayoutResult<Self> {
        if x.len() != y.len() {
            return Err(LayoutError::InvalidGraph(format!(
                "x has {} values but y has {}",
                x.len(),
                y.len()
            )));
        }
        let dense = impute_zeros(x, y).ok_or_else(|| {
            LayoutError::InvalidGraph(format!(
                "sparse positions span more than {MAX_DENSE_SPAN} bases"
            ))
        })?;
        let min = x.iter().min().copied().unwrap_or(0);
        let positions = (0..dense.len()).map(|i| (min + i as u64) as f64).collect();
        Self::new(positions, dense)
    }

    pub fn format(mut self, format: GraphFormat) -> Self {
        self.format = format;
        self
    }

    pub fn fill(mut self, fill: bool) -> Self {
        self.fill = fill;
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha.clamp(0.0, 1.0);
        self
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    fn xlimits(&self) -> (f64, f64) {
        self.x
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
                (lo.min(x), hi.max(x))
            })
    }

    fn series(&self, index: usize, resolution: usize) -> LayoutResult<Series> {
        let (x, y) = match self.format {
            GraphFormat::Raw => (self.x.clone(), self.y.clone()),
            GraphFormat::Interpolate => Akima::new(&self.x, &self.y)?.resample(resolution),
        };

        Ok(Series {
            x,
            y,
            style: Style {
                color: self.color.clone(),
                alpha: self.alpha,
            },
            fill: self.fill,
            z_order: BASE_Z_ORDER + index as f64,
        })
    }
}

/// A track of continuous signal. Graphs are stacked in submission order.
#[derive(Debug, Clone, Default)]
pub struct GraphTrack {
    options: TrackOptions,
    graphs: Vec<Graph>,
}

impl GraphTrack {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_options(TrackOptions::new(name))
    }

    pub fn with_options(options: TrackOptions) -> Self {
        Self {
            options,
            graphs: Vec::new(),
        }
    }

    pub fn options(&self) -> &TrackOptions {
        &self.options
    }

    pub fn add_graph(&mut self, graph: Graph) {
        self.graphs.push(graph);
    }

    pub fn graphs(&self) -> &[Graph] {
        &self.graphs
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    pub fn xlimits(&self) -> LayoutResult<(f64, f64)> {
        if self.is_empty() {
            return Err(LayoutError::EmptyTrack);
        }
        Ok(self
            .graphs
            .iter()
            .map(Graph::xlimits)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (a, b)| {
                (lo.min(a), hi.max(b))
            }))
    }

    pub fn layout(&self) -> LayoutResult<TrackLayout> {
        let xlimits = self.xlimits()?;
        self.layout_in(xlimits)
    }

    pub fn layout_in(&self, xlimits: (f64, f64)) -> LayoutResult<TrackLayout> {
        if self.is_empty() {
            return Err(LayoutError::EmptyTrack);
        }

        let series = self
            .graphs
            .iter()
            .enumerate()
            .map(|(index, graph)| graph.series(index, self.options.resolution))
            .collect::<LayoutResult<Vec<_>>>()?;

        let top = series
            .iter()
            .flat_map(|series| series.y.iter().copied())
            .fold(0.0_f64, f64::max);

        Ok(TrackLayout {
            geometry: Geometry::Series { series },
            xlimits,
            ylimits: (0.0, if top > 0.0 { top } else { 1.0 }),
        })
    }
}

/// Any track that can be placed in a [`Diagram`](crate::Diagram).
#[derive(Debug, Clone)]
pub enum Track {
    Intervals(IntervalTrack),
    Graph(GraphTrack),
}

impl Track {
    pub fn options(&self) -> &TrackOptions {
        match self {
            Track::Intervals(track) => track.options(),
            Track::Graph(track) => track.options(),
        }
    }

    pub fn name(&self) -> &str {
        self.options().name()
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Track::Intervals(track) => track.is_empty(),
            Track::Graph(track) => track.is_empty(),
        }
    }

    pub fn xlimits(&self) -> LayoutResult<(f64, f64)> {
        match self {
            Track::Intervals(track) => track.xlimits(),
            Track::Graph(track) => track.xlimits(),
        }
    }

    pub fn layout_in(&self, xlimits: (f64, f64)) -> LayoutResult<TrackLayout> {
        match self {
            Track::Intervals(track) => track.layout_in(xlimits),
            Track::Graph(track) => track.layout_in(xlimits),
        }
    }
}

impl From<IntervalTrack> for Track {
    fn from(track: IntervalTrack) -> Self {
        Track::Intervals(track)
    }
}

impl From<GraphTrack> for Track {
    fn from(track: GraphTrack) -> Self {
        Track::Graph(track)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval(start: u64, end: u64, strand: Strand) -> Interval {
        Interval::new("chr1", start, end, strand).unwrap()
    }

    #[test]
    fn taper_side_follows_strand() {
        let height = 1.0;
        let plus = outline(&interval(0, 100, Strand::Forward), 0.0, height, 10.0);
        assert_eq!(plus[0], [0.0, 0.0]);
        assert_eq!(plus[3], [90.0, 1.0]);
        assert_eq!(plus[4], [100.0, 0.5]);

        let minus = outline(&interval(0, 100, Strand::Reverse), 0.0, height, 10.0);
        assert_eq!(minus[0], [10.0, 0.0]);
        assert_eq!(minus[1], [0.0, 0.5]);
        assert_eq!(minus[5], [100.0, 0.0]);

        let none = outline(&interval(0, 100, Strand::Unknown), 2.0, height, 10.0);
        assert_eq!(none[0], [0.0, 2.0]);
        assert_eq!(none[3], [100.0, 3.0]);
    }

    #[test]
    fn taper_never_exceeds_width() {
        let short = outline(&interval(50, 52, Strand::Forward), 0.0, 1.0, 10.0);
        assert_eq!(short[3], [50.0, 1.0]);
        assert_eq!(short[5], [50.0, 0.0]);
    }

    #[test]
    fn empty_tracks_fail_explicitly() {
        assert_eq!(IntervalTrack::new("a").xlimits(), Err(LayoutError::EmptyTrack));
        assert_eq!(GraphTrack::new("b").layout().unwrap_err(), LayoutError::EmptyTrack);
    }

    #[test]
    fn graph_validation() {
        assert!(matches!(
            Graph::new(vec![0.0, 1.0], vec![1.0]),
            Err(LayoutError::InvalidGraph(_))
        ));
        assert!(matches!(
            Graph::new(vec![], vec![]),
            Err(LayoutError::InvalidGraph(_))
        ));
        assert!(matches!(
            Graph::new(vec![0.0, f64::NAN], vec![1.0, 2.0]),
            Err(LayoutError::InvalidGraph(_))
        ));
    }

    #[test]
    fn sparse_graph_is_dense() {
        let graph = Graph::from_sparse(&[3, 5], &[1.0, 2.0]).unwrap();
        assert_eq!(graph.x(), &[3.0, 4.0, 5.0]);
        assert_eq!(graph.y(), &[1.0, 0.0, 2.0]);
    }

    #[test]
    fn sparse_graph_rejects_unbounded_span() {
        assert!(matches!(
            Graph::from_sparse(&[0, u64::MAX], &[1.0, 2.0]),
            Err(LayoutError::InvalidGraph(_))
        ));
    }
}
