//! Player records and validated players.

use crate::error::RecordError;

/// A raw player row as delivered by the surrounding application.
///
/// Numeric columns arrive as text; nothing here has been validated yet.
/// Convert with [`Player::try_from`] (or load a whole slate with
/// [`PlayerPool::from_records`](super::PlayerPool::from_records)).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerRecord {
    #[cfg_attr(feature = "serde", serde(rename = "ID"))]
    pub id: String,
    #[cfg_attr(feature = "serde", serde(rename = "Name", default))]
    pub name: String,
    /// Projected fantasy points; empty means "no projection".
    #[cfg_attr(feature = "serde", serde(rename = "ExpectedFantasyPoints", default))]
    pub projection: String,
    /// Integer adjustment added to the projection; empty means 0.
    #[cfg_attr(feature = "serde", serde(rename = "PlayerBoost", default))]
    pub boost: String,
    #[cfg_attr(feature = "serde", serde(rename = "Salary"))]
    pub salary: String,
    #[cfg_attr(feature = "serde", serde(rename = "EliminatePlayer", default))]
    pub eliminate: bool,
    #[cfg_attr(feature = "serde", serde(rename = "LockPlayer", default))]
    pub lock: bool,
    #[cfg_attr(feature = "serde", serde(rename = "MinExposure", default))]
    pub min_exposure: Option<f64>,
    #[cfg_attr(feature = "serde", serde(rename = "MaxExposure", default))]
    pub max_exposure: Option<f64>,
}

impl PlayerRecord {
    /// Creates a record with the required columns; flags default to off.
    pub fn new(
        id: impl Into<String>,
        projection: impl Into<String>,
        boost: impl Into<String>,
        salary: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            projection: projection.into(),
            boost: boost.into(),
            salary: salary.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_eliminate(mut self, eliminate: bool) -> Self {
        self.eliminate = eliminate;
        self
    }

    pub fn with_lock(mut self, lock: bool) -> Self {
        self.lock = lock;
        self
    }

    pub fn with_min_exposure(mut self, fraction: f64) -> Self {
        self.min_exposure = Some(fraction);
        self
    }

    pub fn with_max_exposure(mut self, fraction: f64) -> Self {
        self.max_exposure = Some(fraction);
        self
    }
}

/// A validated player.
///
/// A player with `projection == None` stays in the pool for lookups but is
/// never eligible for a lineup, whatever its flags say.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Player {
    pub id: String,
    pub name: String,
    pub projection: Option<f64>,
    pub boost: i64,
    pub salary: u32,
    pub eliminate: bool,
    pub lock: bool,
    /// Minimum fraction of lineups that should contain this player, in [0, 1].
    pub min_exposure: f64,
    /// Per-player cap overriding the global maximum exposure, in [0, 1].
    pub max_exposure: Option<f64>,
}

impl Player {
    /// Creates an eligible player with no flags or exposure targets.
    pub fn new(id: impl Into<String>, projection: f64, boost: i64, salary: u32) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            projection: Some(projection),
            boost,
            salary,
            eliminate: false,
            lock: false,
            min_exposure: 0.0,
            max_exposure: None,
        }
    }

    /// Objective coefficient: projection plus boost.
    ///
    /// Returns `None` when the player has no projection.
    pub fn points(&self) -> Option<f64> {
        self.projection.map(|p| p + self.boost as f64)
    }

    /// Whether the player may ever appear in a lineup.
    ///
    /// Elimination beats every other flag, including `lock`.
    pub fn is_selectable(&self) -> bool {
        self.projection.is_some() && !self.eliminate
    }

    /// The tighter of the global cap and this player's own cap.
    pub fn exposure_cap(&self, global_max: f64) -> f64 {
        match self.max_exposure {
            Some(own) => own.min(global_max),
            None => global_max,
        }
    }
}

impl TryFrom<PlayerRecord> for Player {
    type Error = RecordError;

    fn try_from(record: PlayerRecord) -> Result<Self, Self::Error> {
        let id = record.id.trim().to_string();
        if id.is_empty() {
            return Err(RecordError::MissingId);
        }

        let salary = match record.salary.trim().parse::<u32>() {
            Ok(s) if s > 0 => s,
            _ => {
                return Err(RecordError::InvalidSalary {
                    id,
                    value: record.salary,
                })
            }
        };

        let boost_text = record.boost.trim();
        let boost = if boost_text.is_empty() {
            0
        } else {
            boost_text
                .parse::<i64>()
                .map_err(|_| RecordError::InvalidBoost {
                    id: id.clone(),
                    value: record.boost.clone(),
                })?
        };

        // Unusable projections demote the player to ineligible rather than
        // rejecting the row.
        let projection = record
            .projection
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite());

        let name = if record.name.trim().is_empty() {
            id.clone()
        } else {
            record.name
        };

        Ok(Self {
            id,
            name,
            projection,
            boost,
            salary,
            eliminate: record.eliminate,
            lock: record.lock,
            min_exposure: clamp_fraction(record.min_exposure).unwrap_or(0.0),
            max_exposure: clamp_fraction(record.max_exposure),
        })
    }
}

fn clamp_fraction(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan()).map(|v| v.clamp(0.0, 1.0))
}
