use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

#[cfg(feature = "bz2")]
use bzip2::read::BzDecoder;
#[cfg(feature = "gzip")]
use flate2::read::MultiGzDecoder;
use log::debug;
use memchr::memchr_iter;
use regex::Regex;
#[cfg(feature = "zstd")]
use zstd::stream::read::Decoder as ZstdDecoder;

use crate::gene::{CdsStatus, Exon, Frame, Gene};
use crate::interval::{Interval, IntervalError};
use crate::strand::Strand;

/// Number of tab-separated columns in a refGene record (including `bin`).
pub const REFGENE_FIELD_COUNT: usize = 16;

const BIN: &str = "bin";
const TX_START: &str = "txStart";
const TX_END: &str = "txEnd";
const CDS_START: &str = "cdsStart";
const CDS_END: &str = "cdsEnd";
const EXON_COUNT: &str = "exonCount";
const EXON_STARTS: &str = "exonStarts";
const EXON_ENDS: &str = "exonEnds";
const EXON_FRAMES: &str = "exonFrames";
const SCORE: &str = "score";

/// Result alias for reader operations.
pub type ReaderResult<T> = Result<T, ReaderError>;

/// An error that can occur when reading a refGene file.
#[derive(Debug)]
pub enum ReaderError {
    /// An I/O error.
    Io(io::Error),
    /// An error that occurred when decoding a line.
    InvalidEncoding {
        /// The line number where the error occurred.
        line: usize,
        /// The error message.
        message: String,
    },
    /// An error that occurred when parsing a field.
    InvalidField {
        /// The line number where the error occurred.
        line: usize,
        /// The name of the field that could not be parsed.
        field: &'static str,
        /// The error message.
        message: String,
    },
    /// A record has an unexpected number of fields.
    UnexpectedFieldCount {
        /// The line number where the error occurred.
        line: usize,
        /// The expected number of fields.
        expected: usize,
        /// The actual number of fields.
        actual: usize,
    },
    /// An error that occurred when building a reader.
    Builder(String),
    /// A search pattern failed to compile.
    Pattern(regex::Error),
}

impl fmt::Display for ReaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReaderError::Io(err) => write!(f, "I/O error: {err}"),
            ReaderError::InvalidEncoding { line, message } => {
                write!(f, "invalid UTF-8 at line {line}: {message}")
            }
            ReaderError::InvalidField {
                line,
                field,
                message,
            } => write!(f, "invalid {field} at line {line}: {message}"),
            ReaderError::UnexpectedFieldCount {
                line,
                expected,
                actual,
            } => write!(f, "line {line} had {actual} fields, expected {expected}"),
            ReaderError::Builder(msg) => write!(f, "builder error: {msg}"),
            ReaderError::Pattern(err) => write!(f, "invalid search pattern: {err}"),
        }
    }
}

impl std::error::Error for ReaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReaderError::Io(err) => Some(err),
            ReaderError::Pattern(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ReaderError {
    fn from(err: io::Error) -> Self {
        ReaderError::Io(err)
    }
}

impl From<regex::Error> for ReaderError {
    fn from(err: regex::Error) -> Self {
        ReaderError::Pattern(err)
    }
}

impl ReaderError {
    pub(crate) fn invalid_field(line: usize, field: &'static str, message: String) -> ReaderError {
        ReaderError::InvalidField {
            line,
            field,
            message,
        }
    }

    pub(crate) fn unexpected_field_count(
        line: usize,
        expected: usize,
        actual: usize,
    ) -> ReaderError {
        ReaderError::UnexpectedFieldCount {
            line,
            expected,
            actual,
        }
    }

    fn from_interval(line: usize, field: &'static str, err: IntervalError) -> ReaderError {
        ReaderError::invalid_field(line, field, format!("ERROR: {err} in {line}:{field}"))
    }
}

/// The compression format of the input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Detect the compression format from the file extension.
    #[default]
    Auto,
    /// No compression.
    None,
    /// Gzip compression (`gzip` feature).
    Gzip,
    /// Zstandard compression (`zstd` feature).
    Zstd,
    /// Bzip2 compression (`bz2` feature).
    Bzip2,
}

fn detect_compression_from_extension(path: &Path) -> Compression {
    let ext = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
    match ext {
        "gz" => Compression::Gzip,
        "zst" | "zstd" => Compression::Zstd,
        "bz2" | "bzip2" => Compression::Bzip2,
        _ => Compression::None,
    }
}

enum ReaderSource {
    Path(PathBuf),
    Reader(Box<dyn Read + Send>),
}

/// A builder for creating a [`Reader`].
///
/// # Example
///
/// ```rust,no_run
/// use genome_browser::reader::{Compression, Reader};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let reader = Reader::builder()
///         .from_path("refGene.txt.gz")
///         .compression(Compression::Gzip)
///         .buffer_capacity(128 * 1024)
///         .build()?;
///
///     for gene in reader {
///         let gene = gene?;
///         println!("{} {}", gene.id(), gene.interval().sam_interval());
///     }
///
///     Ok(())
/// }
/// ```
pub struct ReaderBuilder {
    source: Option<ReaderSource>,
    buffer_capacity: usize,
    compression: Compression,
}

impl Default for ReaderBuilder {
    fn default() -> Self {
        Self {
            source: None,
            buffer_capacity: 64 * 1024,
            compression: Compression::default(),
        }
    }
}

impl ReaderBuilder {
    /// Reads from a file on disk.
    pub fn from_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.source = Some(ReaderSource::Path(path.as_ref().into()));
        self
    }

    /// Reads from an arbitrary byte stream. The stream is taken as-is; wrap
    /// it in a decoder first if it is compressed.
    pub fn from_reader<T>(mut self, reader: T) -> Self
    where
        T: Read + Send + 'static,
    {
        self.source = Some(ReaderSource::Reader(Box::new(reader)));
        self
    }

    /// Sets the buffer capacity for the reader.
    ///
    /// The default is 64 KB; values below 8 KB are raised to 8 KB.
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity.max(8 * 1024);
        self
    }

    /// Sets the compression format of a path input.
    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Builds the `Reader`.
    pub fn build(mut self) -> ReaderResult<Reader> {
        let source = self
            .source
            .take()
            .ok_or_else(|| ReaderError::Builder("ERROR: no input source configured".into()))?;

        let stream = match source {
            ReaderSource::Path(path) => self.open_path_stream(&path)?,
            ReaderSource::Reader(reader) => reader,
        };

        Ok(Reader::from_stream(stream, self.buffer_capacity))
    }

    fn open_path_stream(&self, path: &Path) -> ReaderResult<Box<dyn Read + Send>> {
        let file = File::open(path)?;
        let compression = match self.compression {
            Compression::Auto => detect_compression_from_extension(path),
            other => other,
        };
        debug!("opening {} ({compression:?})", path.display());

        match compression {
            Compression::None | Compression::Auto => Ok(Box::new(file)),
            Compression::Gzip => {
                #[cfg(feature = "gzip")]
                {
                    Ok(Box::new(MultiGzDecoder::new(file)))
                }
                #[cfg(not(feature = "gzip"))]
                {
                    Err(ReaderError::Builder(
                        "gzip compression requested but the `gzip` feature is disabled".into(),
                    ))
                }
            }
            Compression::Zstd => {
                #[cfg(feature = "zstd")]
                {
                    Ok(Box::new(ZstdDecoder::new(file)?))
                }
                #[cfg(not(feature = "zstd"))]
                {
                    Err(ReaderError::Builder(
                        "zstd compression requested but the `zstd` feature is disabled".into(),
                    ))
                }
            }
            Compression::Bzip2 => {
                #[cfg(feature = "bz2")]
                {
                    Ok(Box::new(BzDecoder::new(file)))
                }
                #[cfg(not(feature = "bz2"))]
                {
                    Err(ReaderError::Builder(
                        "bzip2 compression requested but the `bz2` feature is disabled".into(),
                    ))
                }
            }
        }
    }
}

/// A streaming refGene decoder.
///
/// Each call to `next` reads one line and yields one [`Gene`]. A malformed
/// record yields an error for that line only; iteration may continue past
/// it. The reader owns its stream: independent traversals need independent
/// readers (see [`RefGene`]).
pub struct Reader {
    inner: BufReader<Box<dyn Read + Send>>,
    buffer: String,
    line_number: usize,
}

impl Reader {
    pub fn builder() -> ReaderBuilder {
        ReaderBuilder::default()
    }

    /// Opens a path, detecting compression from its extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> ReaderResult<Self> {
        Self::builder().from_path(path).build()
    }

    /// Reads uncompressed records from any byte stream.
    pub fn from_reader<T>(reader: T) -> ReaderResult<Self>
    where
        T: Read + Send + 'static,
    {
        Self::builder().from_reader(reader).build()
    }

    fn from_stream(reader: Box<dyn Read + Send>, buffer_capacity: usize) -> Self {
        Self {
            inner: BufReader::with_capacity(buffer_capacity, reader),
            buffer: String::with_capacity(1024),
            line_number: 0,
        }
    }

    /// Returns the number of physical lines consumed so far.
    pub fn current_line(&self) -> usize {
        self.line_number
    }

    /// Returns a borrowing iterator over the remaining records.
    pub fn records(&mut self) -> Records<'_> {
        Records { reader: self }
    }

    /// Returns the first gene whose accession equals `id`.
    pub fn find_by_id(self, id: &str) -> ReaderResult<Option<Gene>> {
        find_first(self, |gene| gene.id() == id)
    }

    /// Returns the first gene whose symbol equals `name`.
    pub fn find_by_name(self, name: &str) -> ReaderResult<Option<Gene>> {
        find_first(self, |gene| gene.name() == Some(name))
    }

    /// Lazily yields genes whose accession or symbol matches `pattern`.
    /// Decode errors are passed through.
    pub fn search(self, pattern: Regex) -> Search {
        Search {
            reader: self,
            pattern,
        }
    }

    fn next_record(&mut self) -> Option<ReaderResult<Gene>> {
        loop {
            match self.fill_buffer() {
                Ok(true) => {
                    self.line_number += 1;
                    if should_skip(&self.buffer) {
                        continue;
                    }
                    return Some(parse_line(&self.buffer, self.line_number));
                }
                Ok(false) => return None,
                Err(err) => return Some(Err(err)),
            }
        }
    }

    fn fill_buffer(&mut self) -> ReaderResult<bool> {
        self.buffer.clear();
        let bytes = match self.inner.read_line(&mut self.buffer) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                // the offending line is consumed even though it is not returned
                self.line_number += 1;
                return Err(ReaderError::InvalidEncoding {
                    line: self.line_number,
                    message: err.to_string(),
                });
            }
            Err(err) => return Err(err.into()),
        };
        if bytes == 0 {
            return Ok(false);
        }
        trim_line(&mut self.buffer);
        Ok(true)
    }
}

impl Iterator for Reader {
    type Item = ReaderResult<Gene>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record()
    }
}

/// An iterator over the records in a `Reader`.
///
/// This struct is created by the `records` method on `Reader`.
pub struct Records<'a> {
    reader: &'a mut Reader,
}

impl<'a> Iterator for Records<'a> {
    type Item = ReaderResult<Gene>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.next_record()
    }
}

/// Lazy regex search over a reader, created by [`Reader::search`].
pub struct Search {
    reader: Reader,
    pattern: Regex,
}

impl Iterator for Search {
    type Item = ReaderResult<Gene>;

    fn next(&mut self) -> Option<Self::Item> {
        for record in self.reader.by_ref() {
            match record {
                Ok(gene) if matches_gene(&self.pattern, &gene) => return Some(Ok(gene)),
                Ok(_) => continue,
                Err(err) => return Some(Err(err)),
            }
        }
        None
    }
}

fn matches_gene(pattern: &Regex, gene: &Gene) -> bool {
    pattern.is_match(gene.id()) || gene.name().is_some_and(|name| pattern.is_match(name))
}

fn find_first<F>(reader: Reader, predicate: F) -> ReaderResult<Option<Gene>>
where
    F: Fn(&Gene) -> bool,
{
    for record in reader {
        let gene = record?;
        if predicate(&gene) {
            return Ok(Some(gene));
        }
    }
    Ok(None)
}

/// A refGene file that can be traversed any number of times.
///
/// Every traversal reopens the file, so traversals never share a cursor and
/// can run on separate threads.
///
/// # Example
///
/// ```rust,no_run
/// use genome_browser::RefGene;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let refgene = RefGene::new("refGene.txt.gz");
///
///     if let Some(gene) = refgene.find_by_name("TP53")? {
///         println!("{} has {} exons", gene.id(), gene.exons().len());
///     }
///
///     for gene in refgene.search("^BRCA[12]$")? {
///         println!("{}", gene?.id());
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RefGene {
    path: PathBuf,
    compression: Compression,
}

impl RefGene {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().into(),
            compression: Compression::Auto,
        }
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens a fresh traversal over all genes.
    pub fn genes(&self) -> ReaderResult<Reader> {
        Reader::builder()
            .from_path(&self.path)
            .compression(self.compression)
            .build()
    }

    pub fn find_by_id(&self, id: &str) -> ReaderResult<Option<Gene>> {
        self.genes()?.find_by_id(id)
    }

    pub fn find_by_name(&self, name: &str) -> ReaderResult<Option<Gene>> {
        self.genes()?.find_by_name(name)
    }

    /// Compiles `pattern` and lazily yields genes whose accession or symbol
    /// matches it.
    pub fn search(&self, pattern: &str) -> ReaderResult<Search> {
        let pattern = Regex::new(pattern)?;
        Ok(self.genes()?.search(pattern))
    }
}

/// Parses a single refGene line into a [`Gene`].
///
/// # Errors
///
/// Returns [`ReaderError::UnexpectedFieldCount`] unless the line has exactly
/// 16 tab-separated fields, and [`ReaderError::InvalidField`] when a scalar
/// column cannot be decoded. Empty elements of the exon lists are skipped.
pub fn parse_line(line: &str, line_number: usize) -> ReaderResult<Gene> {
    let line = line.trim_end_matches(['\n', '\r']);
    let bytes = line.as_bytes();

    let mut fields: Vec<&str> = Vec::with_capacity(REFGENE_FIELD_COUNT);
    let mut field_start = 0usize;
    for tab in memchr_iter(b'\t', bytes) {
        fields.push(&line[field_start..tab]);
        field_start = tab + 1;
    }
    fields.push(&line[field_start..]);

    if fields.len() != REFGENE_FIELD_COUNT {
        return Err(ReaderError::unexpected_field_count(
            line_number,
            REFGENE_FIELD_COUNT,
            fields.len(),
        ));
    }

    let bin = to_u32(fields[0], line_number, BIN)?;
    let id = fields[1];
    let chrom = fields[2];
    let strand: Strand = fields[3]
        .parse()
        .map_err(|err| ReaderError::from_interval(line_number, "strand", err))?;
    let tx_start = to_u64(fields[4], line_number, TX_START)?;
    let tx_end = to_u64(fields[5], line_number, TX_END)?;
    let cds_start = to_u64(fields[6], line_number, CDS_START)?;
    let cds_end = to_u64(fields[7], line_number, CDS_END)?;
    let exon_count = to_u32(fields[8], line_number, EXON_COUNT)?;
    let score = fields[11].parse::<i64>().map_err(|_| {
        ReaderError::invalid_field(
            line_number,
            SCORE,
            format!("ERROR: expected integer, got '{}' in {line_number}:{SCORE}", fields[11]),
        )
    })?;
    let name = fields[12];
    let cds_start_status = to_status(fields[13], line_number, "cdsStartStat")?;
    let cds_end_status = to_status(fields[14], line_number, "cdsEndStat")?;

    let mut interval = Interval::new(chrom, tx_start, tx_end, strand)
        .map_err(|err| ReaderError::from_interval(line_number, TX_END, err))?;
    if !name.is_empty() {
        interval = interval.with_name(name);
    }

    let mut gene = Gene::new(id, interval)
        .with_bin(bin)
        .with_score(score)
        .with_exon_count(exon_count)
        .with_coding_range(cds_start, cds_end)
        .with_cds_status(cds_start_status, cds_end_status);

    let mut starts = fields[9].split(',');
    let mut ends = fields[10].split(',');
    let mut frames = fields[15].split(',');
    let mut index = 0u32;

    loop {
        let (start, end, frame) = (starts.next(), ends.next(), frames.next());
        if start.is_none() && end.is_none() && frame.is_none() {
            break;
        }
        let position = index;
        index += 1;

        let (start, end, frame) = match (start, end, frame) {
            (Some(s), Some(e), Some(f)) if !s.is_empty() && !e.is_empty() && !f.is_empty() => {
                (s, e, f)
            }
            _ => {
                debug!("line {line_number}: skipping exon {position} with an empty element");
                continue;
            }
        };

        let rank = exon_rank(strand, exon_count, position).ok_or_else(|| {
            ReaderError::invalid_field(
                line_number,
                EXON_STARTS,
                format!(
                    "ERROR: exon {} exceeds exonCount {exon_count} in {line_number}:{EXON_STARTS}",
                    position + 1
                ),
            )
        })?;

        let start = to_u64(start, line_number, EXON_STARTS)?;
        let end = to_u64(end, line_number, EXON_ENDS)?;
        let offset = frame.parse::<i64>().map_err(|_| {
            ReaderError::invalid_field(
                line_number,
                EXON_FRAMES,
                format!("ERROR: expected integer, got '{frame}' in {line_number}:{EXON_FRAMES}"),
            )
        })?;
        let frame = Frame::from_offset(offset)
            .map_err(|err| ReaderError::from_interval(line_number, EXON_FRAMES, err))?;

        let interval = Interval::new(chrom, start, end, strand)
            .map_err(|err| ReaderError::from_interval(line_number, EXON_ENDS, err))?;
        let exon = Exon::new(interval, rank, frame)
            .map_err(|err| ReaderError::from_interval(line_number, EXON_STARTS, err))?;
        gene.push_exon(exon);
    }

    Ok(gene)
}

/// Rank of the exon at `position` (0-based, file order) in 5'→3' order.
fn exon_rank(strand: Strand, exon_count: u32, position: u32) -> Option<u32> {
    if position >= exon_count {
        return None;
    }
    match strand {
        Strand::Reverse => Some(exon_count - position),
        Strand::Forward | Strand::Unknown => Some(position + 1),
    }
}

fn to_u64(field: &str, line: usize, label: &'static str) -> ReaderResult<u64> {
    field.parse::<u64>().map_err(|_| {
        ReaderError::invalid_field(
            line,
            label,
            format!("ERROR: expected unsigned integer, got '{field}' in {line}:{label}"),
        )
    })
}

fn to_u32(field: &str, line: usize, label: &'static str) -> ReaderResult<u32> {
    field.parse::<u32>().map_err(|_| {
        ReaderError::invalid_field(
            line,
            label,
            format!("ERROR: expected unsigned integer, got '{field}' in {line}:{label}"),
        )
    })
}

fn to_status(field: &str, line: usize, label: &'static str) -> ReaderResult<CdsStatus> {
    field
        .parse::<CdsStatus>()
        .map_err(|message| ReaderError::invalid_field(line, label, format!("ERROR: {message}")))
}

fn trim_line(line: &mut String) {
    while line.ends_with(['\n', '\r']) {
        line.pop();
    }
}

fn should_skip(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_follows_transcription_direction() {
        assert_eq!(exon_rank(Strand::Forward, 3, 0), Some(1));
        assert_eq!(exon_rank(Strand::Forward, 3, 2), Some(3));
        assert_eq!(exon_rank(Strand::Reverse, 3, 0), Some(3));
        assert_eq!(exon_rank(Strand::Reverse, 3, 2), Some(1));
        assert_eq!(exon_rank(Strand::Unknown, 3, 1), Some(2));
        assert_eq!(exon_rank(Strand::Forward, 3, 3), None);
    }

    #[test]
    fn skip_blank_and_comment_lines() {
        assert!(should_skip(""));
        assert!(should_skip("   "));
        assert!(should_skip("#bin\tname"));
        assert!(!should_skip("585\tNM_1"));
    }

    #[test]
    fn compression_from_extension() {
        assert_eq!(
            detect_compression_from_extension(Path::new("refGene.txt.gz")),
            Compression::Gzip
        );
        assert_eq!(
            detect_compression_from_extension(Path::new("refGene.txt")),
            Compression::None
        );
        assert_eq!(
            detect_compression_from_extension(Path::new("refGene.zst")),
            Compression::Zstd
        );
    }

    #[test]
    fn builder_without_source_fails() {
        assert!(matches!(
            Reader::builder().build(),
            Err(ReaderError::Builder(_))
        ));
    }
}
