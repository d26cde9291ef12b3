pub mod feature_engineering;
pub mod loader;
pub mod summary;

use crate::error::{Result, ScampError};
use ndarray::{Array2, ArrayView1, ArrayView2};
use std::collections::HashSet;

/// Number of decile quantiles in a feature vector (0th through 90th percentile)
pub const NUM_QUANTILES: usize = 10;

/// Number of moment-style summary features (mean, variance, dispersion, IQR)
pub const NUM_MOMENT_FEATURES: usize = 4;

/// Total number of input features per gene
pub const TOTAL_FEATURES: usize = NUM_MOMENT_FEATURES + NUM_QUANTILES;

/// Number of output classes (not-ecDNA, ecDNA)
pub const NUM_CLASSES: usize = 2;

/// Column index of the ecDNA class in probability and label matrices
pub const ECDNA_CLASS: usize = 1;

/// Cell-by-gene copy-number estimates
#[derive(Debug, Clone)]
pub struct CopyNumberMatrix {
    /// Values, rows = cells, columns = genes
    values: Array2<f64>,
    /// Gene identifiers, one per column
    genes: Vec<String>,
    /// Cell identifiers, if the source carried them
    cells: Option<Vec<String>>,
}

impl CopyNumberMatrix {
    /// Create a matrix, checking that every column has a unique gene label
    pub fn new(values: Array2<f64>, genes: Vec<String>) -> Result<Self> {
        if values.ncols() != genes.len() {
            return Err(ScampError::shape_mismatch(
                "gene identifiers for matrix columns",
                values.ncols(),
                genes.len(),
            ));
        }

        let mut seen = HashSet::with_capacity(genes.len());
        for gene in &genes {
            if !seen.insert(gene.as_str()) {
                return Err(ScampError::InvalidInput(format!(
                    "duplicate gene identifier: {}",
                    gene
                )));
            }
        }

        Ok(Self {
            values,
            genes,
            cells: None,
        })
    }

    /// Attach cell identifiers
    pub fn with_cells(mut self, cells: Vec<String>) -> Result<Self> {
        if cells.len() != self.values.nrows() {
            return Err(ScampError::shape_mismatch(
                "cell identifiers for matrix rows",
                self.values.nrows(),
                cells.len(),
            ));
        }
        self.cells = Some(cells);
        Ok(self)
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    pub fn cells(&self) -> Option<&[String]> {
        self.cells.as_deref()
    }

    pub fn n_cells(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_genes(&self) -> usize {
        self.values.ncols()
    }
}

/// Per-gene feature rows paired with the genes that produced them
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    /// Feature values (n_genes x 14)
    features: Array2<f64>,
    /// Gene identifiers, index-aligned with feature rows
    genes: Vec<String>,
}

impl FeatureMatrix {
    pub fn new(features: Array2<f64>, genes: Vec<String>) -> Result<Self> {
        if features.ncols() != TOTAL_FEATURES {
            return Err(ScampError::shape_mismatch(
                "feature columns",
                TOTAL_FEATURES,
                features.ncols(),
            ));
        }
        if features.nrows() != genes.len() {
            return Err(ScampError::shape_mismatch(
                "gene list length",
                features.nrows(),
                genes.len(),
            ));
        }
        Ok(Self { features, genes })
    }

    /// Empty matrix with the correct width
    pub fn empty() -> Self {
        Self {
            features: Array2::zeros((0, TOTAL_FEATURES)),
            genes: Vec::new(),
        }
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    pub fn row(&self, index: usize) -> ArrayView1<'_, f64> {
        self.features.row(index)
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }
}
