use std::collections::{BTreeMap, BTreeSet};
use std::num::NonZero;

use ndarray::Array2;

use crate::board::{Board, Node};
use crate::cell::Cell;
use crate::graph::{GraphError, SimpleGraph, Vertex};
use crate::location::{Dimension, Location};
use crate::shape::{SquareStep, Step};

/// Reasons a builder may become invalid while building.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum BuilderInvalidReason {
    /// A feature like a bridge was inserted outside the bounds specified by `dims` on a builder, or a bridge was placed on the border.
    #[error("feature placed out of bounds")]
    FeatureOutOfBounds,
    /// Two features, e.g. a terminus and a bridge, were placed on the same location.
    #[error("features overlap at {0:?}")]
    OverlappingFeatures(Location),
    /// A blockage borders the bridge at this location.
    #[error("blockage next to the bridge at {0:?}")]
    BlockageNextToBridge(Location),
    /// A lane of the bridge at this location does not have an open cell on both sides.
    #[error("bridge at {0:?} is missing neighbors")]
    BridgeMissingNeighbors(Location),
    #[error(transparent)]
    MalformedGraph(#[from] GraphError),
}

/// Functionality all builders must implement.
///
/// Builders mutate themselves while building but can be [`Clone`]d to save their state at some point.
pub trait Builder: Clone {
    /// Construct a new [`Self`] with the specified dimensions, specified in `(x, y)` order.
    fn with_dims(dims: (Dimension, Dimension)) -> Self;
    /// Add termini or "flow endpoints". The order in which `locations` are specified does not matter.
    ///
    /// May cause the builder to enter a [`FeatureOutOfBounds`](BuilderInvalidReason::FeatureOutOfBounds) invalid state if either location is out of bounds,
    /// or an [`OverlappingFeatures`](BuilderInvalidReason::OverlappingFeatures) one if either location already holds a feature.
    /// If the builder is already in an invalid state, this function does nothing.
    fn add_termini(&mut self, display: char, locations: (Location, Location)) -> &mut Self;
    /// Remove the most recently added pair of termini.
    ///
    /// If the builder is in an invalid state or no termini are present, this function does nothing.
    fn pop_termini(&mut self) -> &mut Self;
    /// Add a bridge at the specified `location`.
    ///
    /// A bridge allows two paths to cross, one horizontally and one vertically, through the same location.
    /// Paths must not change direction while moving through the bridge.
    ///
    /// May cause the builder to enter a [`FeatureOutOfBounds`](BuilderInvalidReason::FeatureOutOfBounds) invalid state if `location` is not an interior location.
    /// If the builder is already in an invalid state, this function does nothing.
    fn add_bridge(&mut self, location: Location) -> &mut Self;
    /// Block a location off; no path may enter it.
    ///
    /// May cause the builder to enter a [`FeatureOutOfBounds`](BuilderInvalidReason::FeatureOutOfBounds) invalid state if `location` is out of bounds,
    /// or an [`OverlappingFeatures`](BuilderInvalidReason::OverlappingFeatures) one if a terminus or bridge is already there.
    /// If the builder is already in an invalid state, this function does nothing.
    fn drop_location(&mut self, location: Location) -> &mut Self;
    /// Check the validity of this builder, ensuring no [`BuilderInvalidReason`] condition has arisen.
    ///
    /// Returns `None` if the builder is valid, `Some(&Vec<BuilderInvalidReason>)` otherwise.
    fn is_valid(&self) -> Option<&Vec<BuilderInvalidReason>>;
    /// Convert the state of this builder into a [`Board`].
    /// If the builder is invalid for any reason, a [`Vec`] of [`BuilderInvalidReason`] will indicate why.
    fn build(&self) -> Result<Board, Vec<BuilderInvalidReason>>;
}

/// A builder for boards with square-shaped cells, i.e. the rectangular boards found in Numberlink puzzles and in Flow Free and its Bridges expansion.
#[derive(Clone)]
pub struct SquareBoardBuilder {
    // width, height
    dims: (Dimension, Dimension),
    cells: Array2<Cell>,
    termini: Vec<(Location, Location)>,
    affiliation_displays: Vec<char>,
    invalid_reasons: Vec<BuilderInvalidReason>,
    bridges: BTreeSet<Location>,
    blockages: BTreeSet<Location>,
}

impl Default for SquareBoardBuilder {
    fn default() -> Self {
        let five = NonZero::new(5).expect("5 is non-zero");
        Self::with_dims((five, five))
    }
}

impl Builder for SquareBoardBuilder {
    fn with_dims(dims: (Dimension, Dimension)) -> Self {
        Self {
            dims,
            cells: Array2::from_shape_simple_fn((dims.1.get(), dims.0.get()), Cell::default),

            termini: Default::default(),
            affiliation_displays: Default::default(),
            invalid_reasons: Default::default(),
            bridges: Default::default(),
            blockages: Default::default(),
        }
    }

    fn add_termini(&mut self, display: char, locations: (Location, Location)) -> &mut Self {
        if !self.invalid_reasons.is_empty() {
            return self;
        }

        for location in [locations.0, locations.1] {
            if !location.within(self.dims) {
                self.invalid_reasons.push(BuilderInvalidReason::FeatureOutOfBounds);
                return self;
            }
        }
        for location in [locations.0, locations.1] {
            if self.cells[location.as_index()].is_feature() {
                self.invalid_reasons.push(BuilderInvalidReason::OverlappingFeatures(location));
                return self;
            }
        }
        if locations.0 == locations.1 {
            self.invalid_reasons.push(BuilderInvalidReason::OverlappingFeatures(locations.0));
            return self;
        }

        // non-null affiliation IDs start at 1
        let aff = self.affiliation_displays.len() + 1;
        self.affiliation_displays.push(display);
        self.termini.push(locations);
        for location in [locations.0, locations.1] {
            self.cells[location.as_index()] = Cell::Terminus { affiliation: aff };
        }

        self
    }

    fn pop_termini(&mut self) -> &mut Self {
        if !self.invalid_reasons.is_empty() {
            return self;
        }

        if let Some((l1, l2)) = self.termini.pop() {
            self.affiliation_displays.pop();
            for location in [l1, l2] {
                self.cells[location.as_index()] = Cell::Empty;
            }
        }

        self
    }

    fn add_bridge(&mut self, location: Location) -> &mut Self {
        if !self.invalid_reasons.is_empty() {
            return self;
        }

        if !location.is_interior(self.dims) {
            self.invalid_reasons.push(BuilderInvalidReason::FeatureOutOfBounds);
            return self;
        }

        match self.cells[location.as_index()] {
            Cell::Bridge { .. } => {}
            cell if cell.is_feature() => self.invalid_reasons.push(BuilderInvalidReason::OverlappingFeatures(location)),
            _ => {
                self.cells[location.as_index()] = Cell::Bridge { affiliations: [None; 2] };
                self.bridges.insert(location);
            }
        }

        self
    }

    fn drop_location(&mut self, location: Location) -> &mut Self {
        if !self.invalid_reasons.is_empty() {
            return self;
        }

        if !location.within(self.dims) {
            self.invalid_reasons.push(BuilderInvalidReason::FeatureOutOfBounds);
            return self;
        }

        match self.cells[location.as_index()] {
            Cell::Blocked => {}
            cell if cell.is_feature() => self.invalid_reasons.push(BuilderInvalidReason::OverlappingFeatures(location)),
            _ => {
                self.cells[location.as_index()] = Cell::Blocked;
                self.blockages.insert(location);
            }
        }

        self
    }

    fn is_valid(&self) -> Option<&Vec<BuilderInvalidReason>> {
        if self.invalid_reasons.is_empty() {
            None
        } else {
            Some(&self.invalid_reasons)
        }
    }

    fn build(&self) -> Result<Board, Vec<BuilderInvalidReason>> {
        if !self.invalid_reasons.is_empty() {
            return Err(self.invalid_reasons.clone());
        }

        let blocked_bridges = self.bridges.iter()
            .filter(|bridge| SquareStep::neighbors_of(**bridge).into_iter()
                .any(|(_, location)| self.blockages.contains(&location)))
            .map(|bridge| BuilderInvalidReason::BlockageNextToBridge(*bridge))
            .collect::<Vec<_>>();
        if !blocked_bridges.is_empty() {
            return Err(blocked_bridges);
        }

        self.build_graph().map_err(|reason| vec![reason])
    }
}

impl SquareBoardBuilder {
    // one vertex per open cell in row-major order; a bridge becomes one vertex per lane
    fn build_graph(&self) -> Result<Board, BuilderInvalidReason> {
        let mut graph = SimpleGraph::new();
        let mut nodes = BTreeMap::new();
        let mut locations: BTreeMap<Location, Vec<Vertex>> = BTreeMap::new();

        for (ind, cell) in self.cells.indexed_iter() {
            let location = Location::from(ind);
            let lanes: Vec<Option<SquareStep>> = match cell {
                Cell::Blocked => continue,
                Cell::Bridge { .. } => SquareStep::FORWARD_VARIANTS.iter().copied().map(Some).collect(),
                _ => vec![None],
            };
            for lane in lanes {
                let v = graph.push_vertex();
                nodes.insert(v, Node { location, lane });
                locations.entry(location).or_default().push(v);
            }
        }

        let vertex_toward = |location: Location, direction: SquareStep| -> Option<Vertex> {
            let here = locations.get(&location)?;
            match here.as_slice() {
                [v] => Some(*v),
                lanes => lanes.get(direction.lane_index()).copied(),
            }
        };

        for (location, _) in &locations {
            // add edges down and to the right, if possible
            for direction in SquareStep::FORWARD_VARIANTS {
                let other = direction.attempt_from(*location);
                if !other.within(self.dims) {
                    continue;
                }
                if let (Some(v1), Some(v2)) = (vertex_toward(*location, *direction), vertex_toward(other, direction.invert())) {
                    graph.add_edge(v1, v2)?;
                }
            }
        }

        for bridge in &self.bridges {
            if locations[bridge].iter().any(|lane| graph.degree(*lane) != 2) {
                return Err(BuilderInvalidReason::BridgeMissingNeighbors(*bridge));
            }
        }

        let mut affiliation_displays = Vec::with_capacity(self.affiliation_displays.len() + 1);
        // affiliation 0 is unaffiliated and will display as empty
        affiliation_displays.push('.');
        affiliation_displays.extend(self.affiliation_displays.iter().copied());

        Ok(Board {
            dims: self.dims,
            cells: self.cells.clone(),
            graph: graph.into_shared(),
            nodes,
            locations,
            termini: self.termini.clone(),
            affiliation_displays,
        })
    }
}
