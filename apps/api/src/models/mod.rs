pub mod career;
pub mod chat;
pub mod profile;

pub use career::{
    ActionType, BadgeTone, CareerPath, DevelopmentAction, ScoreBand, Tier, UNREADABLE_SCORE,
};
pub use chat::{ChatMessage, Sender};
pub use profile::{AnalyzedSkills, EmployeeProfile};
