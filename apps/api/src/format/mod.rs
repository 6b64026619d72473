// Format contracts for generated text.
// AMOT gates every bullet the pipeline offers; skills lines are validated on request.

pub mod amot;
pub mod skills;

pub use amot::{parse_amot, AmotError, AmotParts};
pub use skills::{parse_skills_line, SkillsLine};
