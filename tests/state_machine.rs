//! Drives the motion controller through its state machine against a
//! scripted serial channel, one reply frame per expected command.

use eqgoto::config::Config;
use eqgoto::enums::{Axis, MotionCommand, MotionState, PierSide, RotationDirection};
use eqgoto::mount::Mount;
use eqgoto::protocol::ProtocolVariant;
use eqgoto::transport::Channel;
use eqgoto::MountError;
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct ChannelState {
    incoming: VecDeque<u8>,
    written: Vec<u8>,
}

/// Test double for the serial link. The handle half stays with the test to
/// queue replies and inspect traffic; reads drain queued bytes and an empty
/// queue behaves like a read timeout.
#[derive(Clone, Default)]
struct ScriptedChannel {
    state: Arc<Mutex<ChannelState>>,
}

impl ScriptedChannel {
    fn push_reply(&self, frame: &[u8]) {
        self.state
            .lock()
            .unwrap()
            .incoming
            .extend(frame.iter().copied());
    }

    fn push_error_reply(&self) {
        self.push_reply(&[ProtocolVariant::DEFAULT_ERROR_SENTINEL, b'\n']);
    }

    fn written(&self) -> Vec<u8> {
        self.state.lock().unwrap().written.clone()
    }
}

impl io::Read for ScriptedChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.state.lock().unwrap().incoming.pop_front() {
            Some(b) => {
                buf[0] = b;
                Ok(1)
            }
            None => Err(io::Error::new(io::ErrorKind::TimedOut, "read timed out")),
        }
    }
}

impl io::Write for ScriptedChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.state.lock().unwrap().written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Channel for ScriptedChannel {
    fn purge(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn setup() -> (Mount<ScriptedChannel>, ScriptedChannel) {
    let channel = ScriptedChannel::default();
    let mount = Mount::with_channel(&Config::default(), channel.clone()).unwrap();
    (mount, channel)
}

/// Queues encoder replies for one poll (RA axis first, then DE).
fn push_encoder_replies(channel: &ScriptedChannel, ra_steps: i32, de_steps: i32) {
    channel.push_reply(format!("E {}\n", ra_steps).as_bytes());
    channel.push_reply(format!("E {}\n", de_steps).as_bytes());
}

#[test]
fn handshake_round_trip() {
    let (mut mount, channel) = setup();
    channel.push_reply(b"F\n");
    mount.handshake().unwrap();
    assert_eq!(channel.written(), b"F\n");
}

#[test]
fn goto_accepted_from_idle_and_tracking() {
    let (mut mount, channel) = setup();
    assert_eq!(mount.state(), MotionState::Idle);

    channel.push_reply(b"A\n");
    mount.goto(5.37, 20.).unwrap();
    assert_eq!(mount.state(), MotionState::Slewing);

    let (mut mount, channel) = setup();
    channel.push_reply(b"B\n");
    mount.set_tracking(true).unwrap();
    assert_eq!(mount.state(), MotionState::Tracking);

    channel.push_reply(b"A\n");
    mount.goto(5.37, 20.).unwrap();
    assert_eq!(mount.state(), MotionState::Slewing);
}

#[test]
fn goto_rejected_while_slewing_parking_and_parked() {
    let (mut mount, channel) = setup();

    channel.push_reply(b"A\n");
    mount.goto(5.37, 20.).unwrap();
    assert!(matches!(
        mount.goto(6., 10.),
        Err(MountError::StateConflict { .. })
    ));
    assert_eq!(mount.state(), MotionState::Slewing);

    // park from idle, then while parking and parked
    let (mut mount, channel) = setup();
    channel.push_reply(b"C\n");
    mount.park().unwrap();
    assert_eq!(mount.state(), MotionState::Parking);
    assert!(mount.goto(6., 10.).is_err());

    // arrive at the park position (default 0/0)
    push_encoder_replies(&channel, 0, 0);
    mount.poll().unwrap();
    assert_eq!(mount.state(), MotionState::Parked);
    assert!(matches!(
        mount.goto(6., 10.),
        Err(MountError::StateConflict { .. })
    ));
}

#[test]
fn slew_arrival_goes_idle_when_not_tracking_before() {
    let (mut mount, channel) = setup();

    channel.push_reply(b"A\n");
    mount.goto(5.37, 20.).unwrap();
    let target = mount.target_encoder().unwrap();

    // first poll establishes the timing baseline; zero elapsed time means a
    // zero arrival window
    push_encoder_replies(&channel, target.ra_steps, target.de_steps);
    mount.poll().unwrap();
    assert_eq!(mount.state(), MotionState::Slewing);

    std::thread::sleep(Duration::from_millis(60));
    push_encoder_replies(&channel, target.ra_steps, target.de_steps);
    mount.poll().unwrap();

    assert_eq!(mount.state(), MotionState::Idle);
    assert!(mount.target_position().is_none());
    // current snapped to the target
    let pos = mount.current_position();
    assert!((pos.right_ascension - 5.37).abs() < 1e-9);
    assert!((pos.declination - 20.).abs() < 1e-9);
    assert_ne!(pos.pier_side, PierSide::Unknown);
}

#[test]
fn slew_arrival_resumes_tracking_when_tracking_before() {
    let (mut mount, channel) = setup();

    channel.push_reply(b"B\n");
    mount.set_tracking(true).unwrap();

    channel.push_reply(b"A\n");
    mount.goto(5.37, 20.).unwrap();
    let target = mount.target_encoder().unwrap();

    push_encoder_replies(&channel, target.ra_steps, target.de_steps);
    mount.poll().unwrap();
    assert_eq!(mount.state(), MotionState::Slewing);

    std::thread::sleep(Duration::from_millis(60));
    push_encoder_replies(&channel, target.ra_steps, target.de_steps);
    channel.push_reply(b"B\n"); // re-issued track command
    mount.poll().unwrap();

    assert_eq!(mount.state(), MotionState::Tracking);
}

#[test]
fn distant_encoders_do_not_arrive() {
    let (mut mount, channel) = setup();

    channel.push_reply(b"A\n");
    mount.goto(5.37, 20.).unwrap();
    let target = mount.target_encoder().unwrap();

    push_encoder_replies(&channel, target.ra_steps, target.de_steps);
    mount.poll().unwrap();

    std::thread::sleep(Duration::from_millis(60));
    // a quarter revolution off on the DE axis
    push_encoder_replies(&channel, target.ra_steps, target.de_steps + 9_750);
    mount.poll().unwrap();
    assert_eq!(mount.state(), MotionState::Slewing);
}

#[test]
fn move_axis_restores_tracking() {
    let (mut mount, channel) = setup();

    channel.push_reply(b"B\n");
    mount.set_tracking(true).unwrap();

    channel.push_reply(b"J\n");
    mount
        .move_axis(
            Axis::Primary,
            RotationDirection::Clockwise,
            MotionCommand::Start,
        )
        .unwrap();
    assert_eq!(mount.state(), MotionState::Slewing);

    channel.push_reply(b"K\n");
    channel.push_reply(b"B\n"); // track resumed
    mount
        .move_axis(
            Axis::Primary,
            RotationDirection::Clockwise,
            MotionCommand::Stop,
        )
        .unwrap();
    assert_eq!(mount.state(), MotionState::Tracking);
}

#[test]
fn move_axis_from_idle_ends_idle() {
    let (mut mount, channel) = setup();

    channel.push_reply(b"J\n");
    mount
        .move_axis(
            Axis::Secondary,
            RotationDirection::CounterClockwise,
            MotionCommand::Start,
        )
        .unwrap();
    assert_eq!(mount.state(), MotionState::Slewing);

    channel.push_reply(b"K\n");
    mount
        .move_axis(
            Axis::Secondary,
            RotationDirection::CounterClockwise,
            MotionCommand::Stop,
        )
        .unwrap();
    assert_eq!(mount.state(), MotionState::Idle);
}

#[test]
fn move_axis_start_rejected_while_parked() {
    let (mut mount, channel) = setup();

    channel.push_reply(b"C\n");
    mount.park().unwrap();
    push_encoder_replies(&channel, 0, 0);
    mount.poll().unwrap();
    assert_eq!(mount.state(), MotionState::Parked);

    assert!(matches!(
        mount.move_axis(
            Axis::Primary,
            RotationDirection::Clockwise,
            MotionCommand::Start
        ),
        Err(MountError::StateConflict { .. })
    ));
}

#[test]
fn error_sentinel_fails_operations_without_state_change() {
    let (mut mount, channel) = setup();

    channel.push_error_reply();
    assert!(matches!(mount.goto(5.37, 20.), Err(MountError::Protocol(_))));
    assert_eq!(mount.state(), MotionState::Idle);
    assert!(mount.target_position().is_none());

    channel.push_error_reply();
    assert!(mount.park().is_err());
    assert_eq!(mount.state(), MotionState::Idle);

    channel.push_error_reply();
    assert!(mount.set_track_rate(15.041, 0.).is_err());
    assert_eq!(mount.state(), MotionState::Idle);

    channel.push_error_reply();
    assert!(mount.set_tracking(true).is_err());
    assert_eq!(mount.state(), MotionState::Idle);

    // a failed abort leaves the slew in place
    channel.push_reply(b"A\n");
    mount.goto(5.37, 20.).unwrap();
    channel.push_error_reply();
    assert!(mount.abort().is_err());
    assert_eq!(mount.state(), MotionState::Slewing);
}

#[test]
fn abort_drops_target_and_goes_idle() {
    let (mut mount, channel) = setup();

    channel.push_reply(b"A\n");
    mount.goto(5.37, 20.).unwrap();
    assert_eq!(mount.state(), MotionState::Slewing);

    channel.push_reply(b"H\n");
    mount.abort().unwrap();
    assert_eq!(mount.state(), MotionState::Idle);
    assert!(mount.target_position().is_none());
}

#[test]
fn parking_requires_exact_encoder_match() {
    let (mut mount, channel) = setup();

    channel.push_reply(b"C\n");
    mount.park().unwrap();

    push_encoder_replies(&channel, 500, -500);
    mount.poll().unwrap();
    assert_eq!(mount.state(), MotionState::Parking);

    push_encoder_replies(&channel, 0, 0);
    mount.poll().unwrap();
    assert_eq!(mount.state(), MotionState::Parked);
}

#[test]
fn unpark_returns_to_idle_and_allows_goto() {
    let (mut mount, channel) = setup();

    channel.push_reply(b"C\n");
    mount.park().unwrap();
    push_encoder_replies(&channel, 0, 0);
    mount.poll().unwrap();
    assert_eq!(mount.state(), MotionState::Parked);

    mount.unpark().unwrap();
    assert_eq!(mount.state(), MotionState::Idle);

    channel.push_reply(b"A\n");
    mount.goto(5.37, 20.).unwrap();
    assert_eq!(mount.state(), MotionState::Slewing);
}

#[test]
fn set_current_park_persists_polled_position() {
    let (mut mount, channel) = setup();

    channel.push_reply(b"B\n");
    mount.set_tracking(true).unwrap();
    push_encoder_replies(&channel, 1200, -340);
    mount.poll().unwrap();

    channel.push_reply(b"D\n");
    mount.set_current_park().unwrap();
    let park = mount.park_position();
    assert_eq!((park.ra_steps, park.de_steps), (1200, -340));
}

#[test]
fn timeout_surfaces_as_transport_error() {
    let (mut mount, _channel) = setup();
    // nothing scripted: the read times out
    assert!(matches!(
        mount.handshake(),
        Err(MountError::Transport(_))
    ));
}

#[test]
fn sync_updates_current_without_motor_commands() {
    let (mut mount, channel) = setup();

    mount.sync(5.37, 20.).unwrap();
    assert!(channel.written().is_empty());
    let pos = mount.current_position();
    assert!((pos.right_ascension - 5.37).abs() < 1e-9);
    assert!((pos.declination - 20.).abs() < 1e-9);
    assert_eq!(mount.state(), MotionState::Idle);
}
