use core::fmt;

use embedded_hal::{
    digital::{OutputPin, PinState},
    pwm::SetDutyCycle,
};

use super::{MotorEffort, OpenLoopDrive};

#[derive(Debug, PartialEq, Eq)]
pub enum HBridgeError<P, A, B> {
    Pwm(P),
    In1(A),
    In2(B),
}

impl<P: fmt::Debug, A: fmt::Debug, B: fmt::Debug> fmt::Display for HBridgeError<P, A, B> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HBridgeError::Pwm(e) => write!(f, "PWM error: {:?}", e),
            HBridgeError::In1(e) => write!(f, "IN1 pin error: {:?}", e),
            HBridgeError::In2(e) => write!(f, "IN2 pin error: {:?}", e),
        }
    }
}

impl<P: fmt::Debug, A: fmt::Debug, B: fmt::Debug> core::error::Error for HBridgeError<P, A, B> {}

type Error<PWM, IN1, IN2> = HBridgeError<
    <PWM as embedded_hal::pwm::ErrorType>::Error,
    <IN1 as embedded_hal::digital::ErrorType>::Error,
    <IN2 as embedded_hal::digital::ErrorType>::Error,
>;

/// Single DC motor behind an H-bridge: one PWM enable line, two direction
/// inputs.
///
/// | effort   | IN1  | IN2  | duty      |
/// |----------|------|------|-----------|
/// | Forward  | high | low  | effort    |
/// | Backward | low  | high | effort    |
/// | Brake    | high | high | full      |
/// | Release  | low  | low  | off       |
pub struct HBridge<PWM, IN1, IN2> {
    pwm: PWM,
    input_1: IN1,
    input_2: IN2,
    effort: MotorEffort,
}

impl<PWM, IN1, IN2> HBridge<PWM, IN1, IN2>
where
    PWM: SetDutyCycle,
    IN1: OutputPin,
    IN2: OutputPin,
{
    /// Takes the pins and releases the motor.
    pub fn new(pwm: PWM, input_1: IN1, input_2: IN2) -> Result<Self, Error<PWM, IN1, IN2>> {
        let mut bridge = Self {
            pwm,
            input_1,
            input_2,
            effort: MotorEffort::Release,
        };

        // set an initial state
        bridge.drive(MotorEffort::Release)?;

        Ok(bridge)
    }

    /// Gives the pins back, leaving them in whatever state they were last set.
    pub fn free(self) -> (PWM, IN1, IN2) {
        (self.pwm, self.input_1, self.input_2)
    }

    fn set_inputs(&mut self, in_1: bool, in_2: bool) -> Result<(), Error<PWM, IN1, IN2>> {
        self.input_1
            .set_state(PinState::from(in_1))
            .map_err(HBridgeError::In1)?;
        self.input_2
            .set_state(PinState::from(in_2))
            .map_err(HBridgeError::In2)
    }

    fn set_duty_ratio(&mut self, ratio: f32) -> Result<(), Error<PWM, IN1, IN2>> {
        let max = self.pwm.max_duty_cycle();
        let duty = (max as f32 * ratio.clamp(0.0, 1.0)) as u16;
        self.pwm.set_duty_cycle(duty).map_err(HBridgeError::Pwm)
    }
}

impl<PWM, IN1, IN2> OpenLoopDrive for HBridge<PWM, IN1, IN2>
where
    PWM: SetDutyCycle,
    IN1: OutputPin,
    IN2: OutputPin,
{
    type Error = Error<PWM, IN1, IN2>;

    fn drive(&mut self, effort: MotorEffort) -> Result<(), Self::Error> {
        let (in_1, in_2, duty) = match effort {
            MotorEffort::Forward(d) => (true, false, d),
            MotorEffort::Backward(d) => (false, true, d),
            MotorEffort::Brake => (true, true, 1.0),
            MotorEffort::Release => (false, false, 0.0),
        };

        self.set_inputs(in_1, in_2)?;
        self.set_duty_ratio(duty)?;
        self.effort = effort;

        Ok(())
    }

    fn current_effort(&self) -> MotorEffort {
        self.effort
    }
}
