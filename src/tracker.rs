mod linker;
mod matching;
mod spot;
mod track;
mod track_state;

pub use linker::{Linker, LinkerConfig};
pub use matching::{AssignmentResult, distance_costs, linear_assignment};
pub use spot::Spot;
pub use track::{Track, TrackId, TrackSet};
pub use track_state::TrackFate;
