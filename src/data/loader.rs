use crate::data::CopyNumberMatrix;
use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;
use flate2::read::GzDecoder;
use ndarray::Array2;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info, warn};

/// Field values read as missing copy numbers
const MISSING_VALUES: &[&str] = &["", "NA", "NaN", "nan", "N/A"];

/// Supported file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileFormat {
    Csv,
    Tsv,
    GzippedCsv,
    GzippedTsv,
}

impl FileFormat {
    /// Detect file format from path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path.extension().and_then(|e| e.to_str());
        let stem = path.file_stem().and_then(|s| s.to_str());

        match (ext, stem) {
            (Some("gz"), Some(stem)) => {
                if stem.ends_with(".csv") {
                    Ok(FileFormat::GzippedCsv)
                } else if stem.ends_with(".tsv") || stem.ends_with(".txt") {
                    Ok(FileFormat::GzippedTsv)
                } else {
                    Err(anyhow::anyhow!("Cannot determine format of gzipped file"))
                }
            }
            (Some("csv"), _) => Ok(FileFormat::Csv),
            (Some("tsv"), _) | (Some("txt"), _) => Ok(FileFormat::Tsv),
            _ => Err(anyhow::anyhow!("Unsupported file format: {:?}", path)),
        }
    }

    /// Get delimiter character
    pub fn delimiter(&self) -> u8 {
        match self {
            FileFormat::Csv | FileFormat::GzippedCsv => b',',
            FileFormat::Tsv | FileFormat::GzippedTsv => b'\t',
        }
    }

    /// Check if format is gzipped
    pub fn is_gzipped(&self) -> bool {
        matches!(self, FileFormat::GzippedCsv | FileFormat::GzippedTsv)
    }
}

/// Open a delimited file, transparently decompressing gzip
fn open_reader(path: &Path, format: FileFormat) -> Result<Box<dyn Read>> {
    let file = File::open(path).with_context(|| format!("Failed to open file {:?}", path))?;
    if format.is_gzipped() {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Loader for cell-by-gene copy-number tables
pub struct CopyNumberLoader;

impl CopyNumberLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a copy-number matrix; rows are cells, columns are genes
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<CopyNumberMatrix> {
        let path = path.as_ref();
        info!("Loading copy numbers from {:?}", path);

        let format = FileFormat::from_path(path)?;
        debug!("Detected file format: {:?}", format);

        let reader = open_reader(path, format)?;
        let matrix = self
            .parse(reader, format)
            .with_context(|| format!("Failed to parse copy numbers from {:?}", path))?;

        info!(
            "Loaded copy numbers for {} cells x {} genes",
            matrix.n_cells(),
            matrix.n_genes()
        );
        Ok(matrix)
    }

    /// Parse a copy-number table.
    ///
    /// The first column holds cell identifiers when the header is one field
    /// shorter than the data rows or starts with an empty field.
    fn parse<R: Read>(&self, reader: R, format: FileFormat) -> Result<CopyNumberMatrix> {
        let mut csv_reader = ReaderBuilder::new()
            .delimiter(format.delimiter())
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut records = csv_reader.records();
        let header = match records.next() {
            Some(record) => record.context("Failed to read header")?,
            None => bail!("Copy-number file is empty"),
        };
        let header: Vec<String> = header.iter().map(|s| s.trim().to_string()).collect();

        let mut rows: Vec<csv::StringRecord> = Vec::new();
        for result in records {
            let record = result.context("Failed to parse record")?;
            if record.iter().all(|field| field.trim().is_empty()) {
                continue;
            }
            rows.push(record);
        }

        let row_width = rows.first().map(|r| r.len()).unwrap_or(header.len());
        let (genes, has_cell_ids) = if row_width == header.len() + 1 {
            (header, true)
        } else if header.first().map(|h| h.is_empty()).unwrap_or(false) {
            (header[1..].to_vec(), true)
        } else {
            (header, false)
        };

        let n_genes = genes.len();
        let offset = usize::from(has_cell_ids);
        let mut values = Vec::with_capacity(rows.len() * n_genes);
        let mut cells = Vec::with_capacity(rows.len());

        for (line, record) in rows.iter().enumerate() {
            if record.len() != n_genes + offset {
                bail!(
                    "Row {} has {} fields, expected {}",
                    line + 2,
                    record.len(),
                    n_genes + offset
                );
            }
            if has_cell_ids {
                cells.push(record[0].trim().to_string());
            }
            for field in record.iter().skip(offset) {
                values.push(parse_copy_number(field).with_context(|| {
                    format!("Invalid copy number {:?} at row {}", field, line + 2)
                })?);
            }
        }

        let values = Array2::from_shape_vec((rows.len(), n_genes), values)
            .context("Copy-number table is not rectangular")?;

        let matrix = CopyNumberMatrix::new(values, genes)?;
        if has_cell_ids {
            Ok(matrix.with_cells(cells)?)
        } else {
            Ok(matrix)
        }
    }
}

impl Default for CopyNumberLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_copy_number(field: &str) -> Result<f64> {
    let field = field.trim();
    if MISSING_VALUES.contains(&field) {
        return Ok(f64::NAN);
    }
    Ok(field.parse::<f64>()?)
}

/// Load ecDNA labels keyed by gene from a table with `gene` and `label` columns
pub fn load_labels<P: AsRef<Path>>(path: P) -> Result<HashMap<String, u8>> {
    let path = path.as_ref();
    info!("Loading labels from {:?}", path);

    let format = FileFormat::from_path(path)?;
    let reader = open_reader(path, format)?;
    parse_labels(reader, format).with_context(|| format!("Failed to parse labels from {:?}", path))
}

fn parse_labels<R: Read>(reader: R, format: FileFormat) -> Result<HashMap<String, u8>> {
    let mut csv_reader = ReaderBuilder::new()
        .delimiter(format.delimiter())
        .has_headers(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let gene_idx = headers
        .iter()
        .position(|h| h == "gene")
        .context("Missing required column: gene")?;
    let label_idx = headers
        .iter()
        .position(|h| h == "label")
        .context("Missing required column: label")?;

    let mut labels = HashMap::new();
    for (line, result) in csv_reader.records().enumerate() {
        let record = result.context("Failed to parse label record")?;
        let gene = record.get(gene_idx).unwrap_or("").trim().to_string();
        let label = record
            .get(label_idx)
            .and_then(|s| s.trim().parse::<u8>().ok())
            .filter(|&v| v == 0 || v == 1);

        match label {
            Some(label) if !gene.is_empty() => {
                if labels.insert(gene.clone(), label).is_some() {
                    warn!("Duplicate label for gene {}; keeping the last one", gene);
                }
            }
            _ => warn!("Skipping invalid label record at line {}", line + 2),
        }
    }

    info!("Loaded {} gene labels", labels.len());
    Ok(labels)
}
