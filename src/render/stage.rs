//! Frame stages of the deferred renderer.

/// Where the renderer is within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    Stopped,
    /// Models are being written to the G-buffer.
    Geometry,
    /// The ambient pass has been recorded.
    Ambient,
    /// At least one light pass has been recorded.
    Lighting,
    /// The surface was lost or went out of date while starting the frame.
    Invalid,
}

/// Renderer entry points, in the order a frame calls them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageCall {
    Begin,
    DrawModel,
    Ambient,
    AddLight,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Record the call and move to the given stage.
    Advance(RenderStage),
    /// The call is redundant; nothing to record.
    Ignore,
    /// Out of order. The frame in flight is dropped.
    Reject,
}

impl RenderStage {
    pub fn on(self, call: StageCall) -> Transition {
        use RenderStage::*;
        match (self, call) {
            (Stopped, StageCall::Begin) => Transition::Advance(Geometry),
            (Geometry, StageCall::DrawModel) => Transition::Advance(Geometry),
            (Geometry, StageCall::Ambient) => Transition::Advance(Ambient),
            (Ambient, StageCall::Ambient) => Transition::Ignore,
            (Ambient | Lighting, StageCall::AddLight) => Transition::Advance(Lighting),
            (Ambient | Lighting, StageCall::End) => Transition::Advance(Stopped),
            _ => Transition::Reject,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(calls: &[StageCall]) -> Result<RenderStage, (RenderStage, StageCall)> {
        let mut stage = RenderStage::Stopped;
        for call in calls {
            match stage.on(*call) {
                Transition::Advance(next) => stage = next,
                Transition::Ignore => {}
                Transition::Reject => return Err((stage, *call)),
            }
        }
        Ok(stage)
    }

    #[test]
    fn full_frame_returns_to_stopped() {
        let frame = [
            StageCall::Begin,
            StageCall::DrawModel,
            StageCall::DrawModel,
            StageCall::Ambient,
            StageCall::AddLight,
            StageCall::AddLight,
            StageCall::End,
        ];
        assert_eq!(run(&frame), Ok(RenderStage::Stopped));
    }

    #[test]
    fn ambient_only_frame_can_end() {
        let frame = [StageCall::Begin, StageCall::Ambient, StageCall::End];
        assert_eq!(run(&frame), Ok(RenderStage::Stopped));
    }

    #[test]
    fn repeated_ambient_is_ignored() {
        assert_eq!(RenderStage::Ambient.on(StageCall::Ambient), Transition::Ignore);
    }

    #[test]
    fn drawing_after_lighting_started_is_rejected() {
        let frame = [
            StageCall::Begin,
            StageCall::Ambient,
            StageCall::DrawModel,
        ];
        assert_eq!(run(&frame), Err((RenderStage::Ambient, StageCall::DrawModel)));
    }

    #[test]
    fn light_before_ambient_is_rejected() {
        let frame = [StageCall::Begin, StageCall::AddLight];
        assert_eq!(run(&frame), Err((RenderStage::Geometry, StageCall::AddLight)));
    }

    #[test]
    fn begin_twice_is_rejected() {
        assert_eq!(RenderStage::Geometry.on(StageCall::Begin), Transition::Reject);
    }

    #[test]
    fn invalid_frame_rejects_everything() {
        for call in [
            StageCall::Begin,
            StageCall::DrawModel,
            StageCall::Ambient,
            StageCall::AddLight,
            StageCall::End,
        ] {
            assert_eq!(RenderStage::Invalid.on(call), Transition::Reject);
        }
    }
}
