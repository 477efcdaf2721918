//! Timer-driven operator for jogging the marker and playing a program
//!
//! Mirrors a modal editor operator: a command starts it, timer events
//! advance it, and escape or right-click cancels it.

use std::fmt;
use std::time::Duration;

use cncemu_settings::JogSettings;
use tracing::info;

use crate::emulator::VirtualCnc;
use crate::scene::Scene;

/// Direction of a manual jog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JogDirection {
    /// +Z
    Up,
    /// -Z
    Down,
    /// +Y
    Left,
    /// -Y
    Right,
    /// +X
    Forward,
    /// -X
    Backward,
}

impl JogDirection {
    pub fn axis(self) -> usize {
        match self {
            Self::Forward | Self::Backward => 0,
            Self::Left | Self::Right => 1,
            Self::Up | Self::Down => 2,
        }
    }

    pub fn sign(self) -> f64 {
        match self {
            Self::Up | Self::Left | Self::Forward => 1.0,
            Self::Down | Self::Right | Self::Backward => -1.0,
        }
    }

    /// Jog distance for this direction
    pub fn step(self, jog: &JogSettings) -> f64 {
        match self.axis() {
            2 => jog.z_step,
            _ => jog.xy_step,
        }
    }

    fn axis_name(self) -> char {
        ['X', 'Y', 'Z'][self.axis()]
    }
}

impl fmt::Display for JogDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
            Self::Forward => "fwd",
            Self::Backward => "bwd",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    Jog(JogDirection),
    /// Trace a single statement
    Next,
    Reset,
    Play,
    Stop,
}

/// Input delivered to a running operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorEvent {
    Timer,
    Escape,
    RightMouse,
    /// Any other input, named for logging
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorStatus {
    /// The operator keeps receiving timer events
    RunningModal,
    Cancelled,
    /// The event was not consumed
    PassThrough,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Idle,
    Jogging { direction: JogDirection, target: f64 },
    Playing,
}

/// Modal operator driving a [`VirtualCnc`]
#[derive(Debug)]
pub struct ModalOperator {
    mode: Mode,
    jog: JogSettings,
    timer_active: bool,
    reports: Vec<String>,
}

impl ModalOperator {
    pub fn new(jog: JogSettings) -> Self {
        Self {
            mode: Mode::Idle,
            jog,
            timer_active: false,
            reports: Vec::new(),
        }
    }

    /// Interval at which the caller should deliver [`OperatorEvent::Timer`]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.jog.tick_interval_ms)
    }

    /// Whether a timer is registered and events should be delivered
    pub fn is_running(&self) -> bool {
        self.timer_active
    }

    pub fn reports(&self) -> &[String] {
        &self.reports
    }

    pub fn take_reports(&mut self) -> Vec<String> {
        std::mem::take(&mut self.reports)
    }

    fn report(&mut self, message: String) {
        info!("{}", message);
        self.reports.push(message);
    }

    fn cancel(&mut self) -> OperatorStatus {
        self.mode = Mode::Idle;
        self.timer_active = false;
        self.report("Dir: stop".to_string());
        OperatorStatus::Cancelled
    }

    fn start_timer(&mut self, mode: Mode) -> OperatorStatus {
        self.mode = mode;
        self.timer_active = true;
        OperatorStatus::RunningModal
    }

    /// Start a command. Jog and play keep running on timer events; the
    /// other commands complete immediately.
    pub fn execute<S: Scene>(
        &mut self,
        cnc: &mut VirtualCnc<S>,
        command: OperatorCommand,
    ) -> OperatorStatus {
        match command {
            OperatorCommand::Jog(direction) => {
                let current = cnc.scene().marker_location()[direction.axis()];
                let target = current + direction.sign() * direction.step(&self.jog);
                self.report(format!(
                    "Dir: {}, Goal {}: {}",
                    direction,
                    direction.axis_name(),
                    target
                ));
                self.start_timer(Mode::Jogging { direction, target })
            }
            OperatorCommand::Next => {
                if let Err(e) = cnc.layout_path() {
                    self.report(e.to_string());
                }
                OperatorStatus::Cancelled
            }
            OperatorCommand::Reset => {
                if let Err(e) = cnc.reset() {
                    self.report(e.to_string());
                }
                OperatorStatus::Cancelled
            }
            OperatorCommand::Play => {
                self.report_line(cnc);
                self.start_timer(Mode::Playing)
            }
            OperatorCommand::Stop => {
                self.report("Stopping".to_string());
                self.cancel()
            }
        }
    }

    fn report_line<S: Scene>(&mut self, cnc: &VirtualCnc<S>) {
        self.report(format!(
            "Line {}, statement: {}",
            cnc.current_statement(),
            cnc.statement()
        ));
    }

    /// Handle one input event while running
    pub fn handle_event<S: Scene>(
        &mut self,
        cnc: &mut VirtualCnc<S>,
        event: &OperatorEvent,
    ) -> OperatorStatus {
        match event {
            OperatorEvent::Escape | OperatorEvent::RightMouse => self.cancel(),
            OperatorEvent::Timer => match self.mode {
                Mode::Jogging { direction, target } => self.jog_tick(cnc, direction, target),
                Mode::Playing => self.play_tick(cnc),
                Mode::Idle => self.cancel(),
            },
            OperatorEvent::Other(_) => OperatorStatus::PassThrough,
        }
    }

    fn jog_tick<S: Scene>(
        &mut self,
        cnc: &mut VirtualCnc<S>,
        direction: JogDirection,
        target: f64,
    ) -> OperatorStatus {
        let axis = direction.axis();
        let mut location = cnc.scene().marker_location();
        let time = cnc.timeline_time();
        let before_target = if direction.sign() > 0.0 {
            location[axis] < target
        } else {
            location[axis] > target
        };

        if before_target {
            location[axis] += direction.sign() * self.jog.speed;
            if let Err(e) = cnc.scene_mut().move_marker(location, time) {
                self.report(e.to_string());
                return self.cancel();
            }
            self.report(format!(
                "Dir {}, Current {}: {}",
                direction,
                direction.axis_name(),
                location[axis]
            ));
            return OperatorStatus::PassThrough;
        }

        location[axis] = target;
        if let Err(e) = cnc.scene_mut().move_marker(location, time) {
            self.report(e.to_string());
        }
        cnc.sync_location_axis(axis, target);
        self.cancel()
    }

    fn play_tick<S: Scene>(&mut self, cnc: &mut VirtualCnc<S>) -> OperatorStatus {
        if cnc.is_finished() {
            self.report(cnc.message().to_string());
            return self.cancel();
        }
        if let Err(e) = cnc.layout_path() {
            self.report(e.to_string());
        }
        self.report_line(cnc);
        if cnc.is_finished() {
            return self.cancel();
        }
        OperatorStatus::PassThrough
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jog_axes_and_signs() {
        assert_eq!(JogDirection::Up.axis(), 2);
        assert_eq!(JogDirection::Right.axis(), 1);
        assert_eq!(JogDirection::Right.sign(), -1.0);
        assert_eq!(JogDirection::Forward.axis(), 0);
        assert_eq!(JogDirection::Forward.sign(), 1.0);

        let jog = JogSettings {
            xy_step: 0.5,
            z_step: 0.2,
            ..Default::default()
        };
        assert_eq!(JogDirection::Down.step(&jog), 0.2);
        assert_eq!(JogDirection::Backward.step(&jog), 0.5);
    }

    #[test]
    fn test_default_tick_interval() {
        let op = ModalOperator::new(JogSettings::default());
        assert_eq!(op.tick_interval(), Duration::from_millis(100));
        assert!(!op.is_running());
    }
}
