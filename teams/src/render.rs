//! Optional downstream collaborator that turns team state into an artifact.

use crate::{MazeView, TeamKey};

/// Produces an artifact (an image, an export file, ...) from a team's view.
pub trait Render {
    /// Artifact produced on success.
    type Artifact;

    /// Renders the provided view for the team.
    fn render(&self, team: &TeamKey, view: &MazeView) -> Result<Self::Artifact, RenderError>;
}

/// Rendering failed. Never fatal to the mutation that preceded it.
#[derive(Debug, thiserror::Error)]
#[error("render failed: {message}")]
pub struct RenderError {
    message: String,
}

impl RenderError {
    /// Creates a render failure with a human readable reason.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result of a successful operation paired with the outcome of rendering it.
#[derive(Debug)]
pub struct Rendered<T, A> {
    /// Result of the operation; already persisted.
    pub value: T,
    /// Artifact produced afterwards, or why it could not be produced.
    pub artifact: Result<A, RenderError>,
}
