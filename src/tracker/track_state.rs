/// Lifecycle of a plate track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackState {
    /// Created this frame from an unmatched detection
    #[default]
    New,
    /// Matched in the most recent frame
    Tracked,
    /// Unmatched for at least one frame, still eligible for matching
    Lost,
}
