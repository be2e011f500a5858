
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info, warn};

use crate::{Result, WikicheckError};

/// Serialises the exists-then-save sequence of every builder in the process
static BUILD_LOCK: Mutex<()> = Mutex::new(());

/// Identity of a persisted projection matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    pub source_dim: usize,
    pub target_dim: usize,
}

impl ArtifactKey {
    #[inline]
    pub fn new(source_dim: usize, target_dim: usize) -> Self {
        Self {
            source_dim,
            target_dim,
        }
    }
}

impl std::fmt::Display for ArtifactKey {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "rand_proj_mat_modeldim={}_embeddim={}",
            self.source_dim, self.target_dim
        )
    }
}

/// Fixed random linear map from `source_dim` to `target_dim`, stored row-major
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionMatrix {
    source_dim: usize,
    target_dim: usize,
    seed: u64,
    entries: Vec<f32>,
}

#[derive(Serialize, Deserialize)]
struct MatrixArtifact {
    source_dim: usize,
    target_dim: usize,
    seed: u64,
    entries: Vec<f32>,
}

impl ProjectionMatrix {
    /// Draw a `target_dim x source_dim` matrix of standard normal entries from `seed`.
    ///
    /// Entries come from a `ChaCha8Rng` seeded with `seed`, filled row by row.
    /// ChaCha output is stable across platforms and crate releases, so the same
    /// arguments always produce the same matrix.
    pub fn generate(source_dim: usize, target_dim: usize, seed: u64) -> Result<Self> {
        let len = entry_count(source_dim, target_dim)?;

        let mut entries = Vec::new();
        entries.try_reserve_exact(len).map_err(|e| {
            WikicheckError::Config(format!(
                "cannot allocate a {target_dim}x{source_dim} projection matrix: {e}"
            ))
        })?;

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        entries.extend(
            StandardNormal
                .sample_iter(&mut rng)
                .take(len)
                .map(|value: f64| value as f32),
        );

        Ok(Self {
            source_dim,
            target_dim,
            seed,
            entries,
        })
    }

    pub fn from_entries(
        source_dim: usize,
        target_dim: usize,
        seed: u64,
        entries: Vec<f32>,
    ) -> Result<Self> {
        let expected = entry_count(source_dim, target_dim)?;
        if entries.len() != expected {
            return Err(WikicheckError::DimensionMismatch {
                expected,
                actual: entries.len(),
            });
        }

        Ok(Self {
            source_dim,
            target_dim,
            seed,
            entries,
        })
    }

    #[inline]
    pub fn source_dim(&self) -> usize {
        self.source_dim
    }

    #[inline]
    pub fn target_dim(&self) -> usize {
        self.target_dim
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline]
    pub fn key(&self) -> ArtifactKey {
        ArtifactKey::new(self.source_dim, self.target_dim)
    }

    #[inline]
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        let start = index.checked_mul(self.source_dim)?;
        self.entries.get(start..start.checked_add(self.source_dim)?)
    }

    /// Multiply `vector` (length `source_dim`) by the matrix
    pub fn project(&self, vector: &[f32]) -> Result<Vec<f32>> {
        if vector.len() != self.source_dim {
            return Err(WikicheckError::DimensionMismatch {
                expected: self.source_dim,
                actual: vector.len(),
            });
        }

        let projected = self
            .entries
            .chunks_exact(self.source_dim)
            .map(|row| {
                row.iter()
                    .zip(vector)
                    .fold(0.0f32, |acc, (&weight, &value)| acc + weight * value)
            })
            .collect();

        Ok(projected)
    }
}

/// Number of entries in a `target_dim x source_dim` matrix
fn entry_count(source_dim: usize, target_dim: usize) -> Result<usize> {
    if source_dim == 0 || target_dim == 0 {
        return Err(WikicheckError::Config(format!(
            "projection dimensions must be positive (source {source_dim}, target {target_dim})"
        )));
    }

    source_dim.checked_mul(target_dim).ok_or_else(|| {
        WikicheckError::Config(format!(
            "projection of {source_dim} to {target_dim} dimensions is too large"
        ))
    })
}

/// Persistence for projection matrices keyed by `(source_dim, target_dim)`
pub trait ArtifactStore: Send + Sync {
    fn exists(&self, key: &ArtifactKey) -> Result<bool>;

    /// Persist `matrix` under `key`; never replaces an existing artifact
    fn save(&self, key: &ArtifactKey, matrix: &ProjectionMatrix) -> Result<()>;

    fn load(&self, key: &ArtifactKey) -> Result<ProjectionMatrix>;
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    #[inline]
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    #[inline]
    pub fn path_for(&self, key: &ArtifactKey) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl ArtifactStore for FsArtifactStore {
    fn exists(&self, key: &ArtifactKey) -> Result<bool> {
        Ok(self.path_for(key).try_exists()?)
    }

    fn save(&self, key: &ArtifactKey, matrix: &ProjectionMatrix) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let path = self.path_for(key);

        let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(WikicheckError::DuplicateArtifact(key.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let artifact = MatrixArtifact {
            source_dim: matrix.source_dim,
            target_dim: matrix.target_dim,
            seed: matrix.seed,
            entries: matrix.entries.clone(),
        };

        let mut writer = BufWriter::new(file);
        let written = serde_json::to_writer(&mut writer, &artifact)
            .map_err(WikicheckError::from)
            .and_then(|()| writer.flush().map_err(WikicheckError::from));

        if let Err(e) = written {
            // A half-written artifact would block every later build of this key
            warn!("Removing incomplete artifact {}: {}", path.display(), e);
            let _ = fs::remove_file(&path);
            return Err(e);
        }

        debug!("Saved projection matrix to {}", path.display());
        Ok(())
    }

    fn load(&self, key: &ArtifactKey) -> Result<ProjectionMatrix> {
        let path = self.path_for(key);

        let file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(WikicheckError::ArtifactNotFound(key.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let artifact: MatrixArtifact = serde_json::from_reader(BufReader::new(file))?;
        if artifact.source_dim != key.source_dim || artifact.target_dim != key.target_dim {
            return Err(WikicheckError::Config(format!(
                "artifact {} holds a {}x{} matrix",
                path.display(),
                artifact.target_dim,
                artifact.source_dim
            )));
        }

        ProjectionMatrix::from_entries(
            artifact.source_dim,
            artifact.target_dim,
            artifact.seed,
            artifact.entries,
        )
    }
}

/// One-shot offline tool that generates and persists projection matrices
#[derive(Debug, Clone)]
pub struct ProjectionBuilder<S> {
    store: S,
}

impl<S: ArtifactStore> ProjectionBuilder<S> {
    #[inline]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[inline]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Generate the matrix for `(source_dim, target_dim, seed)` and persist it.
    ///
    /// Fails with [`WikicheckError::DuplicateArtifact`] when a matrix for the
    /// same dimensions already exists, whatever seed it was built from.
    pub fn build(&self, source_dim: usize, target_dim: usize, seed: u64) -> Result<ProjectionMatrix> {
        let key = ArtifactKey::new(source_dim, target_dim);
        let matrix = ProjectionMatrix::generate(source_dim, target_dim, seed)?;

        let _guard = BUILD_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

        if self.store.exists(&key)? {
            warn!("Refusing to overwrite projection matrix {}", key);
            return Err(WikicheckError::DuplicateArtifact(key.to_string()));
        }

        self.store.save(&key, &matrix)?;

        info!(
            "Built projection matrix {} ({}x{}, seed {})",
            key, target_dim, source_dim, seed
        );
        Ok(matrix)
    }
}
