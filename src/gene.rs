use std::fmt;
use std::str::FromStr;

use crate::interval::{Interval, IntervalError, IntervalResult};
use crate::strand::Strand;

/// Reading-frame offset of an exon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Frame {
    Zero,
    One,
    Two,
}

impl Frame {
    /// Converts a refGene frame value. `-1` means the exon is not translated.
    pub fn from_offset(offset: i64) -> IntervalResult<Option<Frame>> {
        match offset {
            -1 => Ok(None),
            0 => Ok(Some(Frame::Zero)),
            1 => Ok(Some(Frame::One)),
            2 => Ok(Some(Frame::Two)),
            other => Err(IntervalError::InvalidFrame(other)),
        }
    }

    #[inline]
    pub fn offset(&self) -> u8 {
        match self {
            Frame::Zero => 0,
            Frame::One => 1,
            Frame::Two => 2,
        }
    }
}

/// Completeness of a coding-region boundary (`cdsStartStat`/`cdsEndStat`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CdsStatus {
    /// No coding region (`none`).
    #[default]
    None,
    /// Unknown completeness (`unk`).
    Unknown,
    /// Incomplete (`incmpl`).
    Incomplete,
    /// Complete (`cmpl`).
    Complete,
}

impl CdsStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CdsStatus::None => "none",
            CdsStatus::Unknown => "unk",
            CdsStatus::Incomplete => "incmpl",
            CdsStatus::Complete => "cmpl",
        }
    }
}

impl FromStr for CdsStatus {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "none" => Ok(CdsStatus::None),
            "unk" => Ok(CdsStatus::Unknown),
            "incmpl" => Ok(CdsStatus::Incomplete),
            "cmpl" => Ok(CdsStatus::Complete),
            other => Err(format!("expected none, unk, incmpl or cmpl, got '{other}'")),
        }
    }
}

impl fmt::Display for CdsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An exon owned by a [`Gene`].
///
/// `rank` follows the direction of transcription: the 5'-most exon is rank 1,
/// which is the lowest coordinate on `+` and the highest on `-`.
#[derive(Debug, Clone, PartialEq)]
pub struct Exon {
    interval: Interval,
    rank: u32,
    frame: Option<Frame>,
}

impl Exon {
    pub fn new(interval: Interval, rank: u32, frame: Option<Frame>) -> IntervalResult<Self> {
        if rank == 0 {
            return Err(IntervalError::InvalidRank);
        }
        Ok(Self {
            interval,
            rank,
            frame,
        })
    }

    #[inline]
    pub fn interval(&self) -> &Interval {
        &self.interval
    }

    #[inline]
    pub fn start(&self) -> u64 {
        self.interval.start()
    }

    #[inline]
    pub fn end(&self) -> u64 {
        self.interval.end()
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.interval.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[inline]
    pub fn rank(&self) -> u32 {
        self.rank
    }

    #[inline]
    pub fn frame(&self) -> Option<Frame> {
        self.frame
    }
}

/// A transcript decoded from one refGene record.
///
/// The transcript span, strand and display name (the gene symbol) live in
/// the wrapped [`Interval`]; `id` is the accession (`NM_...`, `NR_...`).
#[derive(Debug, Clone, PartialEq)]
pub struct Gene {
    interval: Interval,
    id: String,
    bin: u32,
    score: i64,
    coding_start: Option<u64>,
    coding_end: Option<u64>,
    cds_start_status: CdsStatus,
    cds_end_status: CdsStatus,
    exon_count: u32,
    exons: Vec<Exon>,
}

impl Gene {
    pub fn new(id: impl Into<String>, interval: Interval) -> Self {
        Self {
            interval,
            id: id.into(),
            bin: 0,
            score: 0,
            coding_start: None,
            coding_end: None,
            cds_start_status: CdsStatus::None,
            cds_end_status: CdsStatus::None,
            exon_count: 0,
            exons: Vec::new(),
        }
    }

    /// Sets the coding range. An empty range (`start >= end`) marks the
    /// transcript as non-coding.
    pub fn with_coding_range(mut self, start: u64, end: u64) -> Self {
        if start < end {
            self.coding_start = Some(start);
            self.coding_end = Some(end);
        } else {
            self.coding_start = None;
            self.coding_end = None;
        }
        self
    }

    pub fn with_cds_status(mut self, start: CdsStatus, end: CdsStatus) -> Self {
        self.cds_start_status = start;
        self.cds_end_status = end;
        self
    }

    pub fn with_bin(mut self, bin: u32) -> Self {
        self.bin = bin;
        self
    }

    /// Sets the declared `exonCount`, which may exceed the number of exons
    /// held when some list elements were empty.
    pub fn with_exon_count(mut self, exon_count: u32) -> Self {
        self.exon_count = exon_count;
        self
    }

    pub fn with_score(mut self, score: i64) -> Self {
        self.score = score;
        self
    }

    /// Adds an exon, keeping the exon list sorted by start.
    pub fn with_exon(mut self, exon: Exon) -> Self {
        self.push_exon(exon);
        self
    }

    pub(crate) fn push_exon(&mut self, exon: Exon) {
        let at = self
            .exons
            .partition_point(|other| other.interval.packing_key() <= exon.interval.packing_key());
        self.exons.insert(at, exon);
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the gene symbol, if the record carried one.
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.interval.name()
    }

    #[inline]
    pub fn interval(&self) -> &Interval {
        &self.interval
    }

    #[inline]
    pub fn chrom(&self) -> &str {
        self.interval.chrom()
    }

    #[inline]
    pub fn start(&self) -> u64 {
        self.interval.start()
    }

    #[inline]
    pub fn end(&self) -> u64 {
        self.interval.end()
    }

    #[inline]
    pub fn strand(&self) -> Strand {
        self.interval.strand()
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.interval.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[inline]
    pub fn bin(&self) -> u32 {
        self.bin
    }

    #[inline]
    pub fn score(&self) -> i64 {
        self.score
    }

    #[inline]
    pub fn coding_start(&self) -> Option<u64> {
        self.coding_start
    }

    #[inline]
    pub fn coding_end(&self) -> Option<u64> {
        self.coding_end
    }

    #[inline]
    pub fn cds_start_status(&self) -> CdsStatus {
        self.cds_start_status
    }

    #[inline]
    pub fn cds_end_status(&self) -> CdsStatus {
        self.cds_end_status
    }

    #[inline]
    pub fn is_coding(&self) -> bool {
        self.coding_start.is_some()
    }

    /// Returns the exons ordered by ascending start.
    #[inline]
    /// Declared exon count, never less than the number of exons held.
    pub fn exon_count(&self) -> u32 {
        self.exon_count.max(self.exons.len() as u32)
    }

    /// Exons by their position in the refGene lists, with `None` for skipped
    /// elements. Falls back to start order when ranks do not map onto
    /// distinct positions.
    fn exon_slots(&self) -> Vec<Option<&Exon>> {
        let count = self.exon_count() as usize;
        let mut slots: Vec<Option<&Exon>> = vec![None; count];

        for exon in &self.exons {
            let position = match self.strand() {
                Strand::Reverse => (count as u32).checked_sub(exon.rank),
                Strand::Forward | Strand::Unknown => exon.rank.checked_sub(1),
            };
            match position.map(|p| p as usize) {
                Some(p) if p < count && slots[p].is_none() => slots[p] = Some(exon),
                _ => return self.exons.iter().map(Some).collect(),
            }
        }
        slots
    }

    pub fn exons(&self) -> &[Exon] {
        &self.exons
    }

    /// Returns the exon with the given 1-based transcript rank.
    pub fn exon_by_rank(&self, rank: u32) -> Option<&Exon> {
        self.exons.iter().find(|exon| exon.rank == rank)
    }

    /// Returns `true` if every exon lies inside the transcript bounds.
    pub fn exons_within_transcript(&self) -> bool {
        self.exons
            .iter()
            .all(|exon| exon.start() >= self.start() && exon.end() <= self.end())
    }

    /// Returns the gaps between consecutive exons.
    pub fn introns(&self) -> Vec<(u64, u64)> {
        self.exons
            .windows(2)
            .filter_map(|pair| {
                let (left, right) = (pair[0].end(), pair[1].start());
                (left < right).then_some((left, right))
            })
            .collect()
    }

    /// Returns the total exonic length.
    pub fn exonic_length(&self) -> u64 {
        self.exons.iter().map(Exon::len).sum()
    }

    /// Returns exons clipped to the coding range.
    pub fn coding_exons(&self) -> Vec<(u64, u64)> {
        match (self.coding_start, self.coding_end) {
            (Some(coding_start), Some(coding_end)) => self
                .exons
                .iter()
                .filter_map(|exon| {
                    let start = exon.start().max(coding_start);
                    let end = exon.end().min(coding_end);
                    (start < end).then_some((start, end))
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Returns the total coding sequence length.
    pub fn cds_length(&self) -> u64 {
        self.coding_exons()
            .iter()
            .map(|(start, end)| end - start)
            .sum()
    }

    /// Returns the transcript as a plain interval tagged with its accession,
    /// ready to be placed on a track.
    pub fn to_interval(&self) -> Interval {
        self.interval.clone().with_metadata("id", self.id.as_str())
    }
}

/// Renders the gene as a 16-column refGene line (without trailing newline).
impl fmt::Display for Gene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (cds_start, cds_end) = match (self.coding_start, self.coding_end) {
            (Some(start), Some(end)) => (start, end),
            _ => (self.end(), self.end()),
        };

        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t",
            self.bin,
            self.id,
            self.chrom(),
            self.strand(),
            self.start(),
            self.end(),
            cds_start,
            cds_end,
            self.exon_count()
        )?;

        let slots = self.exon_slots();
        for slot in &slots {
            match slot {
                Some(exon) => write!(f, "{},", exon.start())?,
                None => f.write_str(",")?,
            }
        }
        f.write_str("\t")?;
        for slot in &slots {
            match slot {
                Some(exon) => write!(f, "{},", exon.end())?,
                None => f.write_str(",")?,
            }
        }

        write!(
            f,
            "\t{}\t{}\t{}\t{}\t",
            self.score,
            self.name().unwrap_or(&self.id),
            self.cds_start_status,
            self.cds_end_status
        )?;

        for slot in &slots {
            match slot.map(|exon| exon.frame) {
                Some(Some(frame)) => write!(f, "{},", frame.offset())?,
                Some(None) => f.write_str("-1,")?,
                None => f.write_str(",")?,
            }
        }

        Ok(())
    }
}
