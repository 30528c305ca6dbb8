//! Seat grid: the state of every seat of one event.
//!
//! The grid only knows which transitions are legal. Who may perform them
//! (lease holders, admitted buyers) is decided by the coordinator.

use crate::error::BoxOfficeError;
use crate::types::{Seat, SeatStatus};

/// Row-major seat states of a fixed-size grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeatGrid {
    rows: u32,
    cols: u32,
    cells: Vec<SeatStatus>,
}

/// Seat counts by state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SeatCounts {
    /// Available seats
    pub available: usize,
    /// Held seats
    pub held: usize,
    /// Sold seats
    pub sold: usize,
}

impl SeatGrid {
    /// A grid with every seat available
    #[must_use]
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            rows,
            cols,
            cells: vec![SeatStatus::Available; rows as usize * cols as usize],
        }
    }

    /// Number of rows
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns
    #[must_use]
    pub const fn cols(&self) -> u32 {
        self.cols
    }

    /// Whether the coordinate lies inside the grid
    #[must_use]
    pub const fn contains(&self, seat: Seat) -> bool {
        seat.row < self.rows && seat.col < self.cols
    }

    fn index(&self, seat: Seat) -> Option<usize> {
        self.contains(seat)
            .then(|| seat.row as usize * self.cols as usize + seat.col as usize)
    }

    /// State of a seat, `None` when out of bounds
    #[must_use]
    pub fn status(&self, seat: Seat) -> Option<SeatStatus> {
        self.index(seat).map(|i| self.cells[i])
    }

    /// Move a seat to `to`.
    ///
    /// Legal moves are `available → held`, `held → available`,
    /// `available → sold` and `held → sold`.
    ///
    /// # Errors
    ///
    /// - [`BoxOfficeError::InvalidSeat`] when the coordinate is out of bounds
    /// - [`BoxOfficeError::SeatUnavailable`] when the move is not legal from
    ///   the seat's current state (the grid is left unchanged)
    pub fn transition(&mut self, seat: Seat, to: SeatStatus) -> Result<(), BoxOfficeError> {
        let index = self.index(seat).ok_or(BoxOfficeError::InvalidSeat(seat))?;
        let from = self.cells[index];

        if !Self::is_legal(from, to) {
            return Err(BoxOfficeError::SeatUnavailable(seat));
        }

        self.cells[index] = to;
        Ok(())
    }

    /// Whether `from → to` is one of the four legal moves
    #[must_use]
    pub const fn is_legal(from: SeatStatus, to: SeatStatus) -> bool {
        matches!(
            (from, to),
            (SeatStatus::Available, SeatStatus::Held | SeatStatus::Sold)
                | (SeatStatus::Held, SeatStatus::Available | SeatStatus::Sold)
        )
    }

    /// Seat counts by state
    #[must_use]
    pub fn counts(&self) -> SeatCounts {
        self.cells.iter().fold(SeatCounts::default(), |mut counts, status| {
            match status {
                SeatStatus::Available => counts.available += 1,
                SeatStatus::Held => counts.held += 1,
                SeatStatus::Sold => counts.sold += 1,
            }
            counts
        })
    }

    /// Copy of the grid as `rows[row][col]`
    #[must_use]
    pub fn snapshot(&self) -> Vec<Vec<SeatStatus>> {
        self.cells
            .chunks(self.cols.max(1) as usize)
            .map(<[SeatStatus]>::to_vec)
            .collect()
    }
}
