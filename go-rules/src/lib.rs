pub mod engine;
pub mod error;
pub mod estimator;
pub mod goban;
pub mod groups;
pub mod handicap;
pub mod ko;
pub mod move_tree;
pub mod notation;
pub mod portable;
pub mod removal;
pub mod rules;
pub mod scoring;
pub mod sgf;
pub mod stone;

pub type Point = (u8, u8);

pub use engine::{BoardObserver, Engine, Phase, PlaceOptions};
pub use error::{GoError, IllegalMove};
pub use estimator::{EstimateRequest, EstimationKernel, KernelEstimate, ScoreEstimate};
pub use goban::{Captures, Goban};
pub use groups::{GroupAnalysis, StoneGroup};
pub use move_tree::{BoardState, MoveNode, MoveTree, NodeId};
pub use notation::EncodedMove;
pub use portable::PortableNode;
pub use rules::{GameConfig, InitialState, RuleSet, Rules};
pub use scoring::{PlayerScore, ScoreBreakdown};
pub use sgf::SgfLoad;
pub use stone::Stone;
