// Sentence-aware re-segmentation of subtitle cues
//
// - group: merge fragmentary cues into sentence groups before translation
// - split: distribute a translated sentence back over the cues it came from
// - boundary: pluggable rules deciding where a translation may be cut

pub mod boundary;
pub mod group;
pub mod split;

pub use boundary::{BoundaryRule, PunctuationBoundary};
pub use group::{SentenceGroup, SentenceGrouper};
pub use split::Splitter;

use crate::config::SegmentConfig;

/// Build the grouper and splitter described by the configuration
pub fn from_config(config: &SegmentConfig) -> (SentenceGrouper, Splitter<PunctuationBoundary>) {
    let grouper = SentenceGrouper::new(config.terminal_punctuation.chars());
    let splitter = Splitter::new(
        PunctuationBoundary::new(config.boundary_punctuation.chars()),
        config.search_window,
        config.placeholder.clone(),
    );
    (grouper, splitter)
}
