//! Risk profiling for directional option trades.
//!
//! Maps a three-question psychology questionnaire to a risk score and a
//! trade-duration recommendation:
//! - `PsychologyProfile`: loss aversion, time preference and goal answers
//! - `TradeRecommendation`: profile type, contract duration and reasoning
//! - `TradeDuration`: contract horizon buckets (BLITZ/RUSH/CORE/ORBIT)

pub mod error;
pub mod profile;

pub use error::{ProfileError, ProfileResult};
pub use profile::{
    get_recommendation, recommendation_for_score, Goal, LossAversion, ProfileType,
    PsychologyProfile, TimePreference, TradeDuration, TradeRecommendation, MAX_SCORE,
};
