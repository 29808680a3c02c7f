//! Two-party conflict state machine
//!
//! A [`Conflict`] starts `ongoing` at 50/50 territory and moves to `ended`
//! exactly once. Per-tick dynamics live in [`state`], victory rules in
//! [`victory`], and the append-only event log in [`timeline`].

pub mod state;
pub mod timeline;
pub mod victory;

pub use state::{
    normalize_territory, Conflict, ConflictModifiers, ConflictStats, ConflictStatus, ConflictSummary,
    TerritoryUpdate,
};
pub use timeline::{TimelineEntry, TimelineEvent};
pub use victory::{Victory, VictoryCondition};
