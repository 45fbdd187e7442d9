//! Score estimation through an external randomized kernel.
//!
//! The engine flattens the board into a signed buffer, hands it to an
//! [`EstimationKernel`] and reads back a per-point owner plus a net score.
//! The kernel's playouts are its own business.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Point;
use crate::engine::Engine;
use crate::error::GoError;
use crate::notation;
use crate::stone::Stone;

pub const DEFAULT_TRIALS: u32 = 1000;
pub const DEFAULT_TOLERANCE: f64 = 0.25;

/// Input handed to the kernel. `board` is row-major with black = 1,
/// white = -1 and empty or removed points = 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateRequest {
    pub width: u8,
    pub height: u8,
    pub board: Vec<i8>,
    /// 1 when black is to move, -1 for white.
    pub color_to_move: i8,
    pub trials: u32,
    pub tolerance: f64,
}

/// Kernel output: the settled owner of each point (positive black,
/// negative white, zero neutral) and the net score for black before komi.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelEstimate {
    pub ownership: Vec<i8>,
    pub score: f64,
}

pub trait EstimationKernel: Send + Sync {
    fn estimate(&self, request: &EstimateRequest) -> Result<KernelEstimate, GoError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEstimate {
    pub width: u8,
    pub height: u8,
    /// Raw kernel ownership.
    pub heat: Vec<i8>,
    /// Settled owner per point as a cell value: 1, -1 or 0 for neutral.
    pub area: Vec<i8>,
    /// The board that was estimated, removed stones included.
    pub board: Vec<i8>,
    /// Black's lead after komi; negative when white leads.
    pub estimated_score: f64,
    pub winner: Stone,
    pub amount: f64,
}

impl ScoreEstimate {
    /// Points that are neutral, or whose stone is owned by the other color.
    pub fn probably_dead_points(&self) -> Vec<Point> {
        let cols = self.width as usize;
        self.area
            .iter()
            .zip(&self.board)
            .enumerate()
            .filter(|&(_, (&area, &cell))| area == 0 || (cell != 0 && area != cell))
            .map(|(i, _)| ((i % cols) as u8, (i / cols) as u8))
            .collect()
    }

    /// [`probably_dead_points`](Self::probably_dead_points) as a sorted
    /// encoded move list.
    pub fn probably_dead(&self) -> String {
        let mut encoded: Vec<String> = self
            .probably_dead_points()
            .into_iter()
            .map(|p| notation::encode_point(Some(p)))
            .collect();
        encoded.sort();
        encoded.concat()
    }
}

impl Engine {
    pub fn set_estimator(&mut self, kernel: Arc<dyn EstimationKernel>) {
        self.estimator = Some(kernel);
    }

    pub fn clear_estimator(&mut self) {
        self.estimator = None;
    }

    /// Estimate the score of the board being shown. Zero `trials` or
    /// `tolerance` take the defaults. Fails with `EstimatorUnavailable` when
    /// no kernel is installed or the kernel fails; engine state is never
    /// touched.
    pub fn estimate_score(&self, trials: u32, tolerance: f64) -> Result<ScoreEstimate, GoError> {
        let Some(kernel) = self.estimator.as_ref() else {
            return Err(GoError::EstimatorUnavailable);
        };
        let trials = if trials == 0 { DEFAULT_TRIALS } else { trials };
        let tolerance = if tolerance == 0.0 { DEFAULT_TOLERANCE } else { tolerance };

        let board: Vec<i8> = self
            .goban
            .board()
            .iter()
            .zip(&self.removal)
            .map(|(&cell, &removed)| if removed { 0 } else { cell })
            .collect();
        let request = EstimateRequest {
            width: self.width(),
            height: self.height(),
            board,
            color_to_move: self.player.to_int(),
            trials,
            tolerance,
        };

        let started = Instant::now();
        let result = kernel.estimate(&request).map_err(|err| {
            debug!(error = %err, "estimation kernel failed");
            GoError::EstimatorUnavailable
        })?;
        debug!(trials, elapsed_ms = started.elapsed().as_millis() as u64, "score estimated");

        if result.ownership.len() != request.board.len() {
            return Err(GoError::malformed(format!(
                "estimator returned {} points for a board of {}",
                result.ownership.len(),
                request.board.len()
            )));
        }

        let estimated_score = result.score - self.rules.komi;
        Ok(ScoreEstimate {
            width: request.width,
            height: request.height,
            area: result.ownership.iter().map(|o| o.signum()).collect(),
            heat: result.ownership,
            board: self.goban.board().to_vec(),
            estimated_score,
            winner: if estimated_score > 0.0 { Stone::Black } else { Stone::White },
            amount: estimated_score.abs(),
        })
    }

    /// Encoded points the estimator considers dead or neutral.
    pub fn get_probably_dead(&self, trials: u32, tolerance: f64) -> Result<String, GoError> {
        Ok(self.estimate_score(trials, tolerance)?.probably_dead())
    }
}
