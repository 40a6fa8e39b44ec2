//! Questionnaire scoring and recommendation table.
//!
//! Each answer contributes 0 (cautious) or 1 (aggressive) to the score, so
//! the score ranges over 0..=3. The recommendation is a lookup indexed by the
//! score; every one of the 8 possible profiles lands on exactly one row.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ProfileError, ProfileResult};

/// Highest reachable score.
pub const MAX_SCORE: u8 = 3;

/// "The market drops 20% overnight. You..."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LossAversion {
    PanicSell,
    BuyTheDip,
}

/// "How long can you wait for a trade to play out?"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimePreference {
    Patient,
    Impatient,
}

/// "What are you here for?"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Goal {
    SteadyIncome,
    MaximizeUpside,
}

macro_rules! answer_from_str {
    ($ty:ident { $($text:literal => $variant:ident),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
                    $($text => Ok(Self::$variant),)+
                    other => Err(format!(
                        "unknown {} answer `{}` (expected one of: {})",
                        stringify!($ty),
                        other,
                        [$($text),+].join(", ")
                    )),
                }
            }
        }
    };
}

answer_from_str!(LossAversion { "panic-sell" => PanicSell, "buy-the-dip" => BuyTheDip });
answer_from_str!(TimePreference { "patient" => Patient, "impatient" => Impatient });
answer_from_str!(Goal { "steady-income" => SteadyIncome, "maximize-upside" => MaximizeUpside });

/// Complete questionnaire answers for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PsychologyProfile {
    pub loss_aversion: LossAversion,
    pub time_preference: TimePreference,
    pub goal: Goal,
}

impl PsychologyProfile {
    #[must_use]
    pub const fn new(
        loss_aversion: LossAversion,
        time_preference: TimePreference,
        goal: Goal,
    ) -> Self {
        Self {
            loss_aversion,
            time_preference,
            goal,
        }
    }

    /// Number of aggressive answers.
    #[must_use]
    pub fn score(&self) -> u8 {
        u8::from(self.loss_aversion == LossAversion::BuyTheDip)
            + u8::from(self.time_preference == TimePreference::Impatient)
            + u8::from(self.goal == Goal::MaximizeUpside)
    }

    /// All 8 answer combinations.
    #[must_use]
    pub fn all() -> Vec<Self> {
        let mut profiles = Vec::with_capacity(8);
        for loss_aversion in [LossAversion::PanicSell, LossAversion::BuyTheDip] {
            for time_preference in [TimePreference::Patient, TimePreference::Impatient] {
                for goal in [Goal::SteadyIncome, Goal::MaximizeUpside] {
                    profiles.push(Self::new(loss_aversion, time_preference, goal));
                }
            }
        }
        profiles
    }
}

/// Risk appetite bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProfileType {
    Safe,
    Balanced,
    Degen,
}

impl fmt::Display for ProfileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Safe => write!(f, "SAFE"),
            Self::Balanced => write!(f, "BALANCED"),
            Self::Degen => write!(f, "DEGEN"),
        }
    }
}

/// Contract duration bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeDuration {
    /// 2-hour contracts.
    Blitz,
    /// 12-hour contracts.
    Rush,
    /// Daily contracts.
    Core,
    /// Weekly contracts.
    Orbit,
}

impl TradeDuration {
    /// Contract horizon of the bucket.
    #[must_use]
    pub fn horizon(self) -> chrono::Duration {
        match self {
            Self::Blitz => chrono::Duration::hours(2),
            Self::Rush => chrono::Duration::hours(12),
            Self::Core => chrono::Duration::hours(24),
            Self::Orbit => chrono::Duration::days(7),
        }
    }
}

impl fmt::Display for TradeDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blitz => write!(f, "BLITZ"),
            Self::Rush => write!(f, "RUSH"),
            Self::Core => write!(f, "CORE"),
            Self::Orbit => write!(f, "ORBIT"),
        }
    }
}

impl FromStr for TradeDuration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BLITZ" => Ok(Self::Blitz),
            "RUSH" => Ok(Self::Rush),
            "CORE" => Ok(Self::Core),
            "ORBIT" => Ok(Self::Orbit),
            other => Err(format!("unknown duration `{other}`")),
        }
    }
}

/// Recommendation derived from a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecommendation {
    pub score: u8,
    pub profile_type: ProfileType,
    pub duration: TradeDuration,
    pub reasoning: String,
}

/// Recommendation table indexed by score.
const RECOMMENDATIONS: [(ProfileType, TradeDuration, &str); MAX_SCORE as usize + 1] = [
    (
        ProfileType::Safe,
        TradeDuration::Orbit,
        "Weekly contracts for recovery time",
    ),
    (
        ProfileType::Balanced,
        TradeDuration::Core,
        "Daily contracts filter noise",
    ),
    (
        ProfileType::Degen,
        TradeDuration::Rush,
        "12-hour contracts for intraday moves",
    ),
    (
        ProfileType::Degen,
        TradeDuration::Blitz,
        "2-hour contracts, max leverage",
    ),
];

/// Look up the recommendation row for a raw score.
pub fn recommendation_for_score(score: u8) -> ProfileResult<TradeRecommendation> {
    let (profile_type, duration, reasoning) = RECOMMENDATIONS
        .get(usize::from(score))
        .ok_or(ProfileError::InvalidProfile {
            score,
            max: MAX_SCORE,
        })?;

    Ok(TradeRecommendation {
        score,
        profile_type: *profile_type,
        duration: *duration,
        reasoning: (*reasoning).to_string(),
    })
}

/// Recommendation for a completed questionnaire.
pub fn get_recommendation(profile: &PsychologyProfile) -> ProfileResult<TradeRecommendation> {
    recommendation_for_score(profile.score())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_cautious_profile_is_safe_orbit() {
        let profile = PsychologyProfile::new(
            LossAversion::PanicSell,
            TimePreference::Patient,
            Goal::SteadyIncome,
        );
        let rec = get_recommendation(&profile).unwrap();
        assert_eq!(rec.score, 0);
        assert_eq!(rec.profile_type, ProfileType::Safe);
        assert_eq!(rec.duration, TradeDuration::Orbit);
    }

    #[test]
    fn test_aggressive_profile_is_degen_blitz() {
        let profile = PsychologyProfile::new(
            LossAversion::BuyTheDip,
            TimePreference::Impatient,
            Goal::MaximizeUpside,
        );
        let rec = get_recommendation(&profile).unwrap();
        assert_eq!(rec.score, 3);
        assert_eq!(rec.profile_type, ProfileType::Degen);
        assert_eq!(rec.duration, TradeDuration::Blitz);
        assert_eq!(rec.reasoning, "2-hour contracts, max leverage");
    }

    #[test]
    fn test_every_profile_maps_to_documented_row() {
        let expected = [
            (ProfileType::Safe, TradeDuration::Orbit),
            (ProfileType::Balanced, TradeDuration::Core),
            (ProfileType::Degen, TradeDuration::Rush),
            (ProfileType::Degen, TradeDuration::Blitz),
        ];
        let mut score_counts: HashMap<u8, usize> = HashMap::new();

        let profiles = PsychologyProfile::all();
        assert_eq!(profiles.len(), 8);

        for profile in profiles {
            let rec = get_recommendation(&profile).unwrap();
            assert_eq!(
                (rec.profile_type, rec.duration),
                expected[usize::from(rec.score)]
            );
            *score_counts.entry(rec.score).or_default() += 1;
        }

        assert_eq!(score_counts[&0], 1);
        assert_eq!(score_counts[&1], 3);
        assert_eq!(score_counts[&2], 3);
        assert_eq!(score_counts[&3], 1);
    }

    #[test]
    fn test_out_of_range_score_rejected() {
        assert_eq!(
            recommendation_for_score(4),
            Err(ProfileError::InvalidProfile { score: 4, max: 3 })
        );
        assert!(recommendation_for_score(u8::MAX).is_err());
    }

    #[test]
    fn test_duration_horizons_are_increasing() {
        let horizons: Vec<_> = [
            TradeDuration::Blitz,
            TradeDuration::Rush,
            TradeDuration::Core,
            TradeDuration::Orbit,
        ]
        .iter()
        .map(|d| d.horizon())
        .collect();
        assert!(horizons.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(TradeDuration::Orbit.horizon().num_hours(), 168);
    }

    #[test]
    fn test_answer_parsing() {
        assert_eq!("buy_the_dip".parse::<LossAversion>(), Ok(LossAversion::BuyTheDip));
        assert_eq!("Patient".parse::<TimePreference>(), Ok(TimePreference::Patient));
        assert_eq!("maximize-upside".parse::<Goal>(), Ok(Goal::MaximizeUpside));
        assert!("yolo".parse::<Goal>().is_err());
        assert_eq!("rush".parse::<TradeDuration>(), Ok(TradeDuration::Rush));
    }

    #[test]
    fn test_recommendation_serializes_camel_case() {
        let rec = recommendation_for_score(1).unwrap();
        let json = serde_json::to_string(&rec).unwrap();
        assert!(json.contains("\"profileType\":\"BALANCED\""));
        assert!(json.contains("\"duration\":\"CORE\""));
    }
}
