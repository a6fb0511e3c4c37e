use crate::puzzle::Color;

/// Board-level flow identifier. `0` is reserved for "no flow"; colored flows start at `1`.
pub type AffiliationID = usize;

pub(crate) fn affiliation_of(color: Color) -> AffiliationID {
    color + 1
}
