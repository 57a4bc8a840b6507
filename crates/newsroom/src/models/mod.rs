pub mod catalog;
pub mod characters;
pub mod compliance;
pub mod fact_sheet;
pub mod generation;
pub mod media;
pub mod preview;
pub mod render;
pub mod social;
pub mod video;

pub use catalog::*;
pub use characters::{Character, CharacterKind, CharacterRoster};
pub use compliance::{AnalysisStatus, CategoryAnalysis, ComplianceFlag, ComplianceReport, Severity};
pub use fact_sheet::{FactSheet, IntakeInput};
pub use generation::{GenerationConfig, GenerationRequest};
pub use media::{ImageRef, RenderedOutput};
pub use preview::{FrameKey, FrameRole, PreviewFrame, PreviewState, PromptChange, RefinementEntry};
pub use render::{RenderJob, RenderOutcome, RenderStatus};
pub use social::{
    CaptionOption, HashtagStrategy, SocialPackage, SocialSection, ThumbnailRecommendation,
    TrendAnalysis,
};
pub use video::{Scene, SceneBreakdown, ScriptDraft, VideoPackage};
