/// Terrain kinds and their properties.
/// Properties are queried via methods, not stored as flags,
/// so terrain semantics are centralized here.

/// The board is square and the same size for every level.
pub const GRID_SIZE: usize = 20;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Terrain {
    Open,
    Tree,  // Impassable
    Water, // Impassable
}

impl Terrain {
    /// Does this terrain block movement (and shots) on its own?
    pub fn is_solid(self) -> bool {
        matches!(self, Terrain::Tree | Terrain::Water)
    }
}

impl Default for Terrain {
    fn default() -> Self {
        Terrain::Open
    }
}
