//! # genome-browser
//!
//! Interval packing and track layout for genome annotation diagrams.
//!
//! ## Overview
//!
//! This library turns genomic intervals and continuous signals into
//! renderer-agnostic geometry. Intervals are packed onto non-overlapping
//! levels, outlined as strand-aware arrows and stacked into tracks; tracks
//! are composed into a diagram sharing one coordinate axis. Gene models are
//! read from UCSC refGene tables.
//!
//! ## Features
//!
//! - **Greedy interval packing:** first-fit level assignment with a
//!   configurable boundary rule, see [`packer`]
//! - **Strand-aware outlines:** six-point polygons tapered on the 3' side
//! - **Signal tracks:** raw or Akima-resampled `(x, y)` series
//! - **Diagram composition:** shared x range, height ratios, bottom-row
//!   axis ticks and annotation, emitted as a [`Manifest`]
//! - **refGene reader:** streaming, optionally compressed, with lookups by
//!   accession, symbol or regex
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! genome-browser = "0.1"
//!
//! # Optional features
//! genome-browser = { version = "0.1", features = ["compression", "rayon", "serde"] }
//! ```
//!
//! ## Basic Usage
//!
//! ### Packing intervals on a track
//!
//! ```rust
//! use genome_browser::{Interval, IntervalTrack, Strand};
//!
//! let mut track = IntervalTrack::new("Genes");
//! track.add_interval(Interval::new("chr1", 10, 20, Strand::Forward).unwrap());
//! track.add_interval(Interval::new("chr1", 15, 25, Strand::Reverse).unwrap());
//! track.add_interval(Interval::new("chr1", 30, 40, Strand::Unknown).unwrap());
//!
//! assert_eq!(track.levels(), vec![0, 1, 0]);
//! ```
//!
//! ### Drawing genes from a refGene table
//!
//! ```rust,no_run
//! use genome_browser::{Diagram, IntervalTrack, RefGene, TrackOptions};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let refgene = RefGene::new("refGene.txt.gz");
//!
//!     let mut genes = IntervalTrack::with_options(TrackOptions::new("Genes").step(10_000));
//!     for gene in refgene.search("^HOXA")? {
//!         genes.add_interval(gene?.to_interval());
//!     }
//!
//!     let mut diagram = Diagram::new().with_name("HOXA cluster");
//!     diagram.add_track(genes, false);
//!     diagram.set_annotation("hg38");
//!
//!     let manifest = diagram.compose()?;
//!     println!("{} rows spanning {:?}", manifest.rows.len(), manifest.xlimits);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Each stage has its own error type: [`IntervalError`] for malformed
//! intervals, [`ReaderError`] for refGene decoding (with the offending line
//! and column), and [`LayoutError`] for tracks and diagrams that cannot be
//! laid out, such as a diagram without data.
//!
//! ## Feature Flags
//!
//! - `gzip` (default): read `.gz` refGene files
//! - `zstd`, `bz2`: read `.zst` and `.bz2` files
//! - `compression`: alias for `gzip`
//! - `rayon`: lay out diagram tracks in parallel
//! - `serde`: serialize manifests and geometry
//! - `cli`: the `genome-browser` binary

#![cfg_attr(doc, warn(missing_docs))]

pub mod diagram;
pub mod gene;
pub mod interpolate;
pub mod interval;
pub mod packer;
pub mod reader;
pub mod strand;
pub mod track;

pub use diagram::{Anchor, Axis, Diagram, Label, Manifest, Row, Tick};
pub use gene::{CdsStatus, Exon, Frame, Gene};
pub use interpolate::{Akima, InterpolateError};
pub use interval::{Interval, IntervalError, IntervalResult, Metadata, Value};
pub use packer::{disjoint_bins, disjoint_bins_with, Boundary, Span};
pub use reader::{
    Compression, Reader, ReaderBuilder, ReaderError, ReaderResult, RefGene, Search,
};
pub use strand::Strand;
pub use track::{
    Geometry, Graph, GraphFormat, GraphTrack, IntervalTrack, LayoutError, LayoutResult, Polygon,
    Series, Style, Track, TrackLayout, TrackOptions,
};
