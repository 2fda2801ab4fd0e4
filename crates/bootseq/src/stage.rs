use std::fmt;

/// Boot milestones in the order they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BootStage {
    Init,
    DetectingCapabilities,
    LoadingExperience,
    PreparingInterface,
    AwaitingBackground,
    Finalizing,
    Complete,
}

impl BootStage {
    pub const ALL: [BootStage; 7] = [
        BootStage::Init,
        BootStage::DetectingCapabilities,
        BootStage::LoadingExperience,
        BootStage::PreparingInterface,
        BootStage::AwaitingBackground,
        BootStage::Finalizing,
        BootStage::Complete,
    ];

    pub fn progress(self) -> u8 {
        match self {
            BootStage::Init => 0,
            BootStage::DetectingCapabilities => 20,
            BootStage::LoadingExperience => 40,
            BootStage::PreparingInterface => 60,
            BootStage::AwaitingBackground => 80,
            BootStage::Finalizing | BootStage::Complete => 100,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BootStage::Init => "Initializing",
            BootStage::DetectingCapabilities => "Detecting capabilities",
            BootStage::LoadingExperience => "Loading experience",
            BootStage::PreparingInterface => "Preparing interface",
            BootStage::AwaitingBackground => "Awaiting background",
            BootStage::Finalizing | BootStage::Complete => "Ready",
        }
    }

    pub fn next(self) -> Option<BootStage> {
        match self {
            BootStage::Init => Some(BootStage::DetectingCapabilities),
            BootStage::DetectingCapabilities => Some(BootStage::LoadingExperience),
            BootStage::LoadingExperience => Some(BootStage::PreparingInterface),
            BootStage::PreparingInterface => Some(BootStage::AwaitingBackground),
            BootStage::AwaitingBackground => Some(BootStage::Finalizing),
            BootStage::Finalizing => Some(BootStage::Complete),
            BootStage::Complete => None,
        }
    }

    /// Stages entered by the progress timers rather than by the join.
    pub fn is_timed(self) -> bool {
        matches!(
            self,
            BootStage::LoadingExperience
                | BootStage::PreparingInterface
                | BootStage::AwaitingBackground
        )
    }
}

impl fmt::Display for BootStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_never_decreases_along_the_chain() {
        let mut stage = BootStage::Init;
        let mut seen = vec![stage];
        while let Some(next) = stage.next() {
            assert!(next.progress() >= stage.progress());
            assert!(next > stage);
            stage = next;
            seen.push(stage);
        }
        assert_eq!(seen, BootStage::ALL);
    }

    #[test]
    fn timed_stages_cover_the_three_timer_steps() {
        let timed = BootStage::ALL
            .iter()
            .filter(|stage| stage.is_timed())
            .count() as u32;
        assert_eq!(timed, bootconfig::TIMED_PROGRESS_STEPS);
    }

    #[test]
    fn finishing_stages_share_the_ready_label() {
        assert_eq!(BootStage::Finalizing.label(), "Ready");
        assert_eq!(BootStage::Complete.progress(), 100);
        assert_eq!(BootStage::AwaitingBackground.progress(), 80);
    }
}
