use crate::affiliation::AffiliationID;

#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) enum Cell {
    Terminus { affiliation: AffiliationID },
    Path { affiliation: AffiliationID },
    // one affiliation per lane, in `Step::FORWARD_VARIANTS` order
    Bridge { affiliations: [Option<AffiliationID>; 2] },
    Blocked,
    #[default]
    Empty,
}

impl Cell {
    pub(crate) fn is_feature(&self) -> bool {
        !matches!(self, Self::Empty | Self::Path { .. })
    }
}
