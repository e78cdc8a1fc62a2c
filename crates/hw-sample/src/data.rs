use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use hw_core::{ErrorInfo, Observable, WalkError};
use hw_walk::Walker;
use serde::{Deserialize, Serialize};

fn io_error(code: &str, err: impl ToString, path: &Path) -> WalkError {
    WalkError::Serde(
        ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
    )
}

fn is_gzip(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "gz")
}

/// `data.dat` becomes `data_3.dat`, `data.dat.gz` becomes `data_3.dat.gz`.
pub fn indexed_path(path: &Path, index: usize) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (name, gz) = match name.strip_suffix(".gz") {
        Some(stem) => (stem.to_string(), ".gz"),
        None => (name, ""),
    };
    let indexed = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}_{index}.{ext}{gz}"),
        _ => format!("{name}_{index}{gz}"),
    };
    path.with_file_name(indexed)
}

enum Sink {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Sink::Plain(w) => w.write(buf),
            Sink::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Sink::Plain(w) => w.flush(),
            Sink::Gzip(w) => w.flush(),
        }
    }
}

/// Line oriented measurement file with `#` comments.
pub struct DataWriter {
    path: PathBuf,
    sink: Sink,
    rows: usize,
}

impl DataWriter {
    /// Creates (truncates) the file and any missing parent directories.
    /// Paths ending in `.gz` are gzip compressed.
    pub fn create(path: &Path) -> Result<Self, WalkError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| io_error("data-mkdir", err, parent))?;
        }
        let file = File::create(path).map_err(|err| io_error("data-create", err, path))?;
        let buffered = BufWriter::new(file);
        let sink = if is_gzip(path) {
            Sink::Gzip(GzEncoder::new(buffered, Compression::default()))
        } else {
            Sink::Plain(buffered)
        };
        Ok(Self {
            path: path.to_path_buf(),
            sink,
            rows: 0,
        })
    }

    /// Path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of data rows written so far.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Writes `# text`.
    pub fn comment(&mut self, text: &str) -> Result<(), WalkError> {
        writeln!(self.sink, "# {text}").map_err(|err| io_error("data-write", err, &self.path))
    }

    /// Writes the invocation and the column names.
    pub fn header(&mut self, invocation: &str, columns: &[String]) -> Result<(), WalkError> {
        self.comment(invocation)?;
        self.comment(&columns.join(" "))
    }

    /// Writes one data row.
    pub fn row(&mut self, line: &str) -> Result<(), WalkError> {
        writeln!(self.sink, "{line}").map_err(|err| io_error("data-write", err, &self.path))?;
        self.rows += 1;
        Ok(())
    }

    /// Writes the run statistics as comments.
    pub fn footer(
        &mut self,
        tries: u64,
        rejects: u64,
        seconds_per_sweep: f64,
    ) -> Result<(), WalkError> {
        let acceptance = if tries == 0 {
            0.0
        } else {
            (tries - rejects) as f64 / tries as f64
        };
        self.comment(&format!("proposed changes: {tries}"))?;
        self.comment(&format!("rejected changes: {rejects}"))?;
        self.comment(&format!("acceptance: {acceptance}"))?;
        self.comment(&format!("time/sweep in seconds: {seconds_per_sweep}"))
    }

    /// Pushes buffered rows to the file.
    pub fn flush(&mut self) -> Result<(), WalkError> {
        self.sink
            .flush()
            .map_err(|err| io_error("data-flush", err, &self.path))
    }

    /// Flushes and closes the file.
    pub fn finish(self) -> Result<PathBuf, WalkError> {
        let path = self.path;
        match self.sink {
            Sink::Plain(mut w) => w.flush().map_err(|err| io_error("data-flush", err, &path))?,
            Sink::Gzip(w) => {
                let mut inner = w.finish().map_err(|err| io_error("data-flush", err, &path))?;
                inner.flush().map_err(|err| io_error("data-flush", err, &path))?;
            }
        }
        Ok(path)
    }
}

/// Reads every line of a data file, decompressing `.gz` files.
pub fn read_lines(path: &Path) -> Result<Vec<String>, WalkError> {
    let file = File::open(path).map_err(|err| io_error("data-read", err, path))?;
    let reader: Box<dyn Read> = if is_gzip(path) {
        Box::new(MultiGzDecoder::new(file))
    } else {
        Box::new(file)
    };
    BufReader::new(reader)
        .lines()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| io_error("data-read", err, path))
}

/// Lines that are neither comments nor empty.
pub fn read_rows(path: &Path) -> Result<Vec<String>, WalkError> {
    Ok(read_lines(path)?
        .into_iter()
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect())
}

/// Observables of one walk, one row of a data file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Sweep (or sample) index.
    pub sweep: usize,
    /// Hull surface.
    pub l: f64,
    /// Hull volume.
    pub a: f64,
    /// End to end distance.
    pub r: f64,
    /// Largest distance between hull vertices.
    pub max_diameter: f64,
    /// Start minus end along the first axis.
    pub rx: f64,
    /// Start minus end along the second axis.
    pub ry: f64,
    /// Vertices of the hull.
    pub num_on_hull: usize,
    /// Longest diameter over twice the perpendicular extent.
    pub oblateness: f64,
    /// Summed step lengths.
    pub length: f64,
    /// Steps actually performed.
    pub steps_taken: usize,
    /// Distinct lattice sites visited.
    pub visited: Option<usize>,
    /// Lattice sites inside the hull.
    pub enclosed: Option<usize>,
    /// Value of the sampled observable.
    pub s: f64,
    /// Passage times for the configured start times.
    pub passages: Vec<Option<usize>>,
}

fn optional<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map_or_else(|| "nan".to_string(), T::to_string)
}

impl Measurement {
    /// Measures `walker`.
    pub fn take(
        sweep: usize,
        walker: &dyn Walker,
        observable: Observable,
        passage_starts: &[usize],
    ) -> Self {
        Self {
            sweep,
            l: walker.surface(),
            a: walker.volume(),
            r: walker.r(),
            max_diameter: walker.max_diameter(),
            rx: walker.rx(),
            ry: walker.ry(),
            num_on_hull: walker.num_on_hull(),
            oblateness: walker.oblateness(),
            length: walker.length(),
            steps_taken: walker.steps_taken(),
            visited: walker.visited_sites(),
            enclosed: walker.enclosed_sites(),
            s: walker.observable(observable),
            passages: passage_starts
                .iter()
                .map(|t| walker.passage(*t, 0))
                .collect(),
        }
    }

    /// Column names matching [`Measurement::to_row`].
    pub fn columns(passage_starts: &[usize]) -> Vec<String> {
        let mut columns: Vec<String> = [
            "sweep", "L", "A", "r", "r2", "maxDiameter", "rx", "ry", "num_on_hull",
            "oblateness", "length", "steps_taken", "visited", "enclosed", "S",
        ]
        .iter()
        .map(|c| c.to_string())
        .collect();
        columns.extend(passage_starts.iter().map(|t| format!("passage{t}")));
        columns
    }

    /// Space separated row, absent values written as `nan`.
    pub fn to_row(&self) -> String {
        let mut fields = vec![
            self.sweep.to_string(),
            self.l.to_string(),
            self.a.to_string(),
            self.r.to_string(),
            (self.r * self.r).to_string(),
            self.max_diameter.to_string(),
            self.rx.to_string(),
            self.ry.to_string(),
            self.num_on_hull.to_string(),
            self.oblateness.to_string(),
            self.length.to_string(),
            self.steps_taken.to_string(),
            optional(&self.visited),
            optional(&self.enclosed),
            self.s.to_string(),
        ];
        fields.extend(self.passages.iter().map(optional));
        fields.join(" ")
    }
}
