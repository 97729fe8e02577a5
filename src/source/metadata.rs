/// Format metadata that influences timing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SceneMetadata {
    /// FBX-style `TimeMode` enumeration value.
    pub time_mode: Option<i32>,
    /// `CustomFrameRate`, consulted when `time_mode` selects a custom rate.
    pub custom_frame_rate: Option<f64>,
}

impl SceneMetadata {
    /// Frame rate implied by the time mode, or `None` when it is unknown.
    ///
    /// Mode 0 ("default") has no defined rate in the format; 24 fps is what
    /// authoring tools use in practice.
    #[must_use]
    pub fn frame_rate(&self) -> Option<f64> {
        let rate = match self.time_mode? {
            0 | 11 => 24.0,
            1 => 120.0,
            2 => 100.0,
            3 => 60.0,
            4 => 50.0,
            5 => 48.0,
            6 | 7 => 30.0,
            8 | 9 => 29.970_026_2,
            10 => 25.0,
            12 => 1000.0,
            13 => 23.976,
            14 => self.custom_frame_rate?,
            15 => 96.0,
            16 => 72.0,
            17 => 59.94,
            _ => return None,
        };
        (rate > 0.0).then_some(rate)
    }
}
