//! k-nearest-neighbor map: validation, orchestration and the single-use process
//!
//! [`knn_map`] is the pure computation. [`KnnMapProcess`] wraps it with
//! progress reporting, one cooperative cancellation check and a
//! run-once guard; [`process`] is the fire-and-forget convenience.

use geo::Coord;
use knnmap_core::progress::{NullProgress, ProgressListener};
use knnmap_core::{Algorithm, Error, Feature, FeatureCollection, Result};
use tracing::{debug, info};

use crate::maybe_rayon::*;
use crate::neighbor::{build_index, query, NeighborSearch};

use super::geometry::build_result;

/// Parameters for a k-nearest-neighbor map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnnMapParams {
    /// Number of neighbors per point (>= 1). Clamped to n - 1.
    pub k: usize,
    /// Emit one hull per neighbor cluster instead of one line per neighbor
    pub convex_hull: bool,
}

impl Default for KnnMapParams {
    fn default() -> Self {
        Self {
            k: 1,
            convex_hull: false,
        }
    }
}

impl KnnMapParams {
    pub fn new(k: usize) -> Self {
        Self { k, ..Default::default() }
    }

    pub fn with_convex_hull(mut self, convex_hull: bool) -> Self {
        self.convex_hull = convex_hull;
        self
    }

    /// Build from possibly-missing values. `k` is required; `convex_hull`
    /// defaults to false.
    pub fn from_options(k: Option<usize>, convex_hull: Option<bool>) -> Result<Self> {
        let k = k.ok_or_else(|| Error::invalid_argument("k", "None", "parameter is required"))?;
        let params = Self {
            k,
            convex_hull: convex_hull.unwrap_or(false),
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(Error::invalid_argument("k", self.k, "must be >= 1"));
        }
        Ok(())
    }
}

/// Point coordinates of `input`, in order.
///
/// # Errors
/// `InvalidArgument` if `input` is empty, holds a non-point feature, or
/// repeats an identifier.
fn point_coords(input: &FeatureCollection) -> Result<Vec<Coord<f64>>> {
    if input.is_empty() {
        return Err(Error::invalid_argument(
            "inputFeatures",
            0,
            "at least one point feature is required",
        ));
    }
    input.validate_unique_ids()?;

    input
        .iter()
        .enumerate()
        .map(|(i, f)| {
            f.coord().ok_or_else(|| {
                Error::invalid_argument(
                    "inputFeatures",
                    f.key(i),
                    "only point geometries are supported",
                )
            })
        })
        .collect()
}

/// Compute a k-nearest-neighbor map.
///
/// For every input point, finds its `k` nearest other points (ties broken
/// by input order) and emits either one line per neighbor or one hull over
/// the cluster. Output preserves input order; lines of the same source are
/// contiguous and ranked.
///
/// # Arguments
/// * `input` - Point features
/// * `params` - Neighbor count and output mode
///
/// # Errors
/// `InvalidArgument` for empty input, non-point features, duplicate IDs or
/// `k == 0`; `Computation` if a result geometry cannot be built.
pub fn knn_map(input: &FeatureCollection, params: KnnMapParams) -> Result<FeatureCollection> {
    params.validate()?;
    let coords = point_coords(input)?;
    let index = build_index(&coords)?;

    let n = index.len();
    let effective_k = params.k.min(n - 1);
    if effective_k < params.k {
        debug!("k = {} exceeds available neighbors, clamped to {}", params.k, effective_k);
    }

    let features = &input.features;
    let groups: Vec<Vec<Feature>> = (0..n)
        .into_par_iter()
        .map(|source| {
            let neighbors = query(&index, source, params.k)?;
            build_result(features, source, &neighbors, params.convex_hull)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut output = FeatureCollection::with_capacity(n * effective_k.max(1));
    for group in groups {
        output.extend(group);
    }

    debug!("KnnMap produced {} features from {} points", output.len(), n);
    Ok(output)
}

/// k-nearest-neighbor map as an [`Algorithm`]
#[derive(Debug, Clone, Copy, Default)]
pub struct KnnMap;

impl Algorithm for KnnMap {
    type Input = FeatureCollection;
    type Output = FeatureCollection;
    type Params = KnnMapParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "KnnMap"
    }

    fn description(&self) -> &'static str {
        "Link every point to its k nearest neighbors, or enclose them in a convex hull"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        knn_map(&input, params)
    }
}

/// Lifecycle of a [`KnnMapProcess`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Idle,
    Running,
    Completed,
    Failed,
}

/// Single-use execution context for [`knn_map`].
///
/// `execute` is only accepted in [`ProcessState::Idle`]; afterwards the
/// process stays `Completed` or `Failed` until [`KnnMapProcess::reset`].
#[derive(Debug)]
pub struct KnnMapProcess {
    state: ProcessState,
}

impl Default for KnnMapProcess {
    fn default() -> Self {
        Self::new()
    }
}

impl KnnMapProcess {
    pub fn new() -> Self {
        Self {
            state: ProcessState::Idle,
        }
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Return to `Idle` so the process may run again.
    pub fn reset(&mut self) {
        self.state = ProcessState::Idle;
    }

    /// Run the map once.
    ///
    /// Returns `Ok(None)` when `listener` reports cancellation at the
    /// check before the main computation. Any other failure is reported to
    /// the listener and returned wrapped in [`Error::Process`]. The
    /// listener is disposed on every path.
    ///
    /// # Errors
    /// [`Error::InvalidState`] (unwrapped) if the process is not `Idle`.
    pub fn execute(
        &mut self,
        input: &FeatureCollection,
        params: KnnMapParams,
        listener: Option<&mut dyn ProgressListener>,
    ) -> Result<Option<FeatureCollection>> {
        self.execute_with(input, Some(params.k), Some(params.convex_hull), listener)
    }

    fn execute_with(
        &mut self,
        input: &FeatureCollection,
        k: Option<usize>,
        convex_hull: Option<bool>,
        listener: Option<&mut dyn ProgressListener>,
    ) -> Result<Option<FeatureCollection>> {
        let mut null = NullProgress;
        let listener: &mut dyn ProgressListener = match listener {
            Some(l) => l,
            None => &mut null,
        };

        if self.state != ProcessState::Idle {
            listener.dispose();
            return Err(Error::InvalidState(format!(
                "process can only be run once (state: {:?}); reset it first",
                self.state
            )));
        }
        self.state = ProcessState::Running;

        let outcome = run(input, k, convex_hull, listener);

        self.state = match &outcome {
            Ok(_) => ProcessState::Completed,
            Err(e) => {
                listener.exception_occurred(e);
                ProcessState::Failed
            }
        };
        listener.dispose();

        outcome.map_err(Error::into_process)
    }
}

fn run(
    input: &FeatureCollection,
    k: Option<usize>,
    convex_hull: Option<bool>,
    listener: &mut dyn ProgressListener,
) -> Result<Option<FeatureCollection>> {
    listener.started();
    listener.set_task("Grabbing arguments");
    listener.progress(10.0);

    if input.is_empty() {
        return Err(Error::invalid_argument(
            "inputFeatures",
            0,
            "inputFeatures, k parameters required",
        ));
    }
    let params = KnnMapParams::from_options(k, convex_hull)?;

    listener.set_task("Processing KnnMap");
    listener.progress(25.0);

    if listener.is_canceled() {
        info!("KnnMap canceled before processing");
        return Ok(None);
    }

    let result = knn_map(input, params)?;

    listener.set_task("Encoding result");
    listener.progress(90.0);
    listener.complete();

    Ok(Some(result))
}

/// Run a k-nearest-neighbor map in a fresh process.
///
/// Missing `k` or `k == 0`, empty input and computation failures are
/// reported to `listener`, logged and yield `None`, as does cancellation.
pub fn process(
    input: &FeatureCollection,
    k: Option<usize>,
    convex_hull: Option<bool>,
    listener: Option<&mut dyn ProgressListener>,
) -> Option<FeatureCollection> {
    let mut runner = KnnMapProcess::new();
    match runner.execute_with(input, k, convex_hull, listener) {
        Ok(result) => result,
        Err(e) => {
            debug!("KnnMap failed: {}", e);
            None
        }
    }
}
