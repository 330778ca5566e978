pub mod evidence;
pub mod orchestrator;
pub mod synthesizer;

pub use evidence::EvidenceCollector;
pub use orchestrator::{DiagnosisError, DiagnosticOrchestrator};
pub use synthesizer::ReportSynthesizer;
