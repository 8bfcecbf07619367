//! Composition of several tracks onto one shared coordinate axis.
//!
//! The resulting [`Manifest`] is the whole contract with a renderer: one
//! [`Row`] per track, top to bottom, each carrying its relative height,
//! the shared x range and the track geometry. Only the last row carries
//! axis ticks and the free-text annotation.

use log::{debug, warn};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::track::{Geometry, LayoutError, LayoutResult, Track, TrackLayout};

/// Where a text label is anchored inside its row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Anchor {
    TopLeft,
    BottomRight,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Label {
    pub text: String,
    pub anchor: Anchor,
}

/// One axis tick: `position` in data units, `label` as an offset from the
/// left edge of the diagram.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick {
    pub position: f64,
    pub label: u64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Axis {
    pub step: u64,
    pub ticks: Vec<Tick>,
}

impl Axis {
    /// Ticks every `step` units from `xlimits.0` up to, not including,
    /// `xlimits.1`, labelled `0, step, 2 * step, ...`.
    pub fn new(xlimits: (f64, f64), step: u64) -> Self {
        let step = step.max(1);
        let origin = xlimits.0.trunc();
        let width = (xlimits.1.trunc() - origin).max(0.0) as u64;

        let ticks = (0..width)
            .step_by(step as usize)
            .map(|offset| Tick {
                position: origin + offset as f64,
                label: offset,
            })
            .collect();

        Self { step, ticks }
    }
}

/// One row of the composed layout.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Row {
    pub name: String,
    pub height_ratio: f64,
    /// `None` for empty tracks.
    pub xlimits: Option<(f64, f64)>,
    pub ylimits: Option<(f64, f64)>,
    pub geometry: Geometry,
    pub label: Option<Label>,
    pub axis: Option<Axis>,
    pub annotation: Option<Label>,
}

/// The composed, renderer-facing layout of a [`Diagram`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Manifest {
    pub title: Option<String>,
    pub xlimits: (f64, f64),
    pub rows: Vec<Row>,
}

impl Manifest {
    pub fn height_ratios(&self) -> Vec<f64> {
        self.rows.iter().map(|row| row.height_ratio).collect()
    }
}

/// An ordered stack of tracks sharing one x axis.
///
/// # Example
///
/// ```
/// use genome_browser::{Diagram, Interval, IntervalTrack, Strand};
///
/// let mut genes = IntervalTrack::new("Genes");
/// genes.add_interval(Interval::new("chr3", 10, 20, Strand::Forward).unwrap());
/// genes.add_interval(Interval::new("chr3", 15, 25, Strand::Reverse).unwrap());
///
/// let mut diagram = Diagram::new().with_name("chr3 locus");
/// diagram.add_track(genes, true);
///
/// let manifest = diagram.compose().unwrap();
/// assert_eq!(manifest.xlimits, (10.0, 25.0));
/// assert!(manifest.rows[0].axis.is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Diagram {
    name: Option<String>,
    annotation: Option<String>,
    tracks: Vec<Track>,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the diagram title.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the text shown in the bottom-right corner of the last row.
    pub fn set_annotation(&mut self, annotation: impl Into<String>) {
        self.annotation = Some(annotation.into());
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn annotation(&self) -> Option<&str> {
        self.annotation.as_deref()
    }

    /// Appends a track. Empty tracks are dropped unless `add_if_empty`;
    /// returns whether the track was added.
    pub fn add_track(&mut self, track: impl Into<Track>, add_if_empty: bool) -> bool {
        let track = track.into();
        if track.is_empty() {
            if !add_if_empty {
                debug!("dropping empty track '{}'", track.name());
                return false;
            }
            warn!("keeping empty track '{}'", track.name());
        }
        self.tracks.push(track);
        true
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn bottom_track(&self) -> Option<&Track> {
        self.tracks.last()
    }

    pub fn height_ratios(&self) -> Vec<f64> {
        self.tracks
            .iter()
            .map(|track| track.options().height())
            .collect()
    }

    /// Union of the ranges of all non-empty tracks.
    pub fn xlimits(&self) -> LayoutResult<(f64, f64)> {
        let mut limits: Option<(f64, f64)> = None;
        for track in self.tracks.iter().filter(|track| !track.is_empty()) {
            let (lo, hi) = track.xlimits()?;
            limits = Some(match limits {
                Some((min, max)) => (min.min(lo), max.max(hi)),
                None => (lo, hi),
            });
        }
        limits.ok_or(LayoutError::EmptyDiagram)
    }

    /// Lays out every track against the shared range and assembles rows.
    pub fn compose(&self) -> LayoutResult<Manifest> {
        let xlimits = self.xlimits()?;

        #[cfg(feature = "rayon")]
        let layouts = self
            .tracks
            .par_iter()
            .map(|track| layout_track(track, xlimits))
            .collect::<LayoutResult<Vec<_>>>()?;
        #[cfg(not(feature = "rayon"))]
        let layouts = self
            .tracks
            .iter()
            .map(|track| layout_track(track, xlimits))
            .collect::<LayoutResult<Vec<_>>>()?;

        let last = self.tracks.len().saturating_sub(1);
        let rows = self
            .tracks
            .iter()
            .zip(layouts)
            .enumerate()
            .map(|(index, (track, layout))| {
                let options = track.options();
                let is_last = index == last;

                let labelled =
                    layout.is_some() && options.is_annotated() && !options.name().is_empty();
                let label = labelled.then(|| Label {
                    text: options.name().to_string(),
                    anchor: Anchor::TopLeft,
                });
                let axis = is_last.then(|| Axis::new(xlimits, options.step_size()));
                let annotation = self
                    .annotation
                    .as_ref()
                    .filter(|_| is_last)
                    .map(|text| Label {
                        text: text.clone(),
                        anchor: Anchor::BottomRight,
                    });

                let (geometry, row_xlimits, ylimits) = match layout {
                    Some(layout) => (
                        layout.geometry,
                        Some(layout.xlimits),
                        Some(layout.ylimits),
                    ),
                    None => (Geometry::Empty, None, None),
                };

                Row {
                    name: options.name().to_string(),
                    height_ratio: options.height(),
                    xlimits: row_xlimits,
                    ylimits,
                    geometry,
                    label,
                    axis,
                    annotation,
                }
            })
            .collect();

        Ok(Manifest {
            title: self.name.clone(),
            xlimits,
            rows,
        })
    }
}

fn layout_track(track: &Track, xlimits: (f64, f64)) -> LayoutResult<Option<TrackLayout>> {
    if track.is_empty() {
        return Ok(None);
    }
    track.layout_in(xlimits).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_are_zero_based_offsets() {
        let axis = Axis::new((1000.0, 2200.0), 500);
        let ticks: Vec<_> = axis.ticks.iter().map(|t| (t.position, t.label)).collect();
        assert_eq!(ticks, vec![(1000.0, 0), (1500.0, 500), (2000.0, 1000)]);
    }

    #[test]
    fn ticks_exclude_right_edge() {
        let axis = Axis::new((0.0, 1000.0), 500);
        assert_eq!(axis.ticks.len(), 2);
    }

    #[test]
    fn empty_diagram_has_no_range() {
        let diagram = Diagram::new();
        assert_eq!(diagram.xlimits(), Err(LayoutError::EmptyDiagram));
        assert_eq!(diagram.compose().unwrap_err(), LayoutError::EmptyDiagram);
    }
}
