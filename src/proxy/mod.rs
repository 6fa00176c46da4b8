pub mod error;
pub mod pipeline;

pub use error::{PushError, TerminalState};
pub use pipeline::{Forwarded, PipelineState, PushPipeline};

pub type ProxyResult = Result<Forwarded, PushError>;

impl Forwarded {
    pub fn terminal_state(&self) -> TerminalState {
        TerminalState::Forwarded
    }
}
